//! Rendering of prediction results into reply text.

use crate::geolocation::PredictionResult;
use crate::localization::Catalog;

/// Render `result` as a 1-indexed list in predictor order.
///
/// An empty result renders as the catalog's `no-location` message.
pub fn format_result(result: &PredictionResult, catalog: &Catalog, lang: &str) -> String {
    if result.is_empty() {
        return catalog.get("no-location", lang);
    }

    let latitude = catalog.get("label-latitude", lang);
    let longitude = catalog.get("label-longitude", lang);
    let confidence = catalog.get("label-confidence", lang);

    result
        .predictions
        .iter()
        .enumerate()
        .map(|(idx, pred)| {
            format!(
                "{}. {}: {:.4}, {}: {:.4}\n   {}: {:.2}%",
                idx + 1,
                latitude,
                pred.latitude,
                longitude,
                pred.longitude,
                confidence,
                pred.score * 100.0
            )
        })
        .collect::<Vec<String>>()
        .join("\n")
}
