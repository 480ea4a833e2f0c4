//! # Geolocation Client Adapter
//!
//! Types for image geolocation predictions and the adapter that runs a
//! synchronous [`Predictor`] off the async event loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task;
use tracing::debug;

/// One predicted location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub latitude: f64,
    pub longitude: f64,
    /// Confidence in `[0, 1]`
    pub score: f64,
}

/// Ordered predictions for one image, best first as returned by the predictor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

impl PredictionResult {
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

/// Any failure of a prediction call
#[derive(Debug, Error)]
pub enum PredictError {
    /// The image could not be read from disk
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// Network or connection failure
    #[error("predictor transport error: {0}")]
    Transport(String),
    /// The API token was refused
    #[error("predictor rejected the API token")]
    Unauthorized,
    /// The API answered with a non-success status
    #[error("predictor rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// The response body could not be decoded
    #[error("malformed predictor response: {0}")]
    Decode(String),
    /// The worker running the call panicked or was cancelled
    #[error("prediction worker failed: {0}")]
    Worker(String),
}

/// Synchronous image geolocation backend
pub trait Predictor: Send + Sync {
    fn localize(&self, image_path: &Path) -> Result<PredictionResult, PredictError>;
}

/// Non-blocking front for a [`Predictor`].
///
/// Each call is handed to tokio's blocking pool while holding one of
/// `max_concurrent` permits. The permit set is private to predictions, so a
/// hung call never starves other blocking work such as file downloads.
#[derive(Clone)]
pub struct GeoClient {
    predictor: Arc<dyn Predictor>,
    permits: Arc<Semaphore>,
}

impl GeoClient {
    pub fn new(predictor: Arc<dyn Predictor>, max_concurrent: usize) -> Self {
        Self {
            predictor,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Run the predictor for `image_path` on a worker thread and await the result
    pub async fn predict(&self, image_path: &Path) -> Result<PredictionResult, PredictError> {
        let predictor = Arc::clone(&self.predictor);
        let path: PathBuf = image_path.to_path_buf();

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| PredictError::Worker(e.to_string()))?;

        debug!(image_path = %path.display(), "Submitting prediction to worker pool");

        // The permit moves into the worker so it is held until the call returns
        task::spawn_blocking(move || {
            let _permit = permit;
            predictor.localize(&path)
        })
        .await
        .map_err(|e| PredictError::Worker(e.to_string()))?
    }
}
