//! Process-wide application context handed to every handler.

use std::sync::Arc;

use anyhow::Result;

use crate::geolocation::{GeoClient, Predictor};
use crate::localization::Catalog;
use crate::transport::Transport;

/// One transport client, one predictor and one message catalog per process
pub struct AppContext {
    pub transport: Arc<dyn Transport>,
    pub geo: GeoClient,
    pub catalog: Catalog,
    /// Chat that receives startup and shutdown notices
    pub admin_chat_id: Option<i64>,
}

impl AppContext {
    pub fn new(
        transport: Arc<dyn Transport>,
        predictor: Arc<dyn Predictor>,
        admin_chat_id: Option<i64>,
        max_concurrent_predictions: usize,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            geo: GeoClient::new(predictor, max_concurrent_predictions),
            catalog: Catalog::new()?,
            admin_chat_id,
        })
    }
}
