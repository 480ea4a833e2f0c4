//! # Picarta API Client
//!
//! Blocking HTTP client for the Picarta image geolocation API. It is only
//! ever called from a worker thread through [`crate::geolocation::GeoClient`].

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::BotConfig;
use crate::errors::ConfigError;
use crate::geolocation::{PredictError, PredictionResult, Predictor};

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    #[serde(rename = "TOKEN")]
    token: &'a str,
    #[serde(rename = "IMAGE")]
    image: String,
    #[serde(rename = "TOP_K")]
    top_k: u32,
}

/// Picarta classify client
#[derive(Debug, Clone)]
pub struct PicartaClient {
    api_token: String,
    endpoint: String,
    top_k: u32,
    /// `None` leaves the call unbounded
    timeout: Option<Duration>,
}

impl PicartaClient {
    pub fn new(
        api_token: impl Into<String>,
        endpoint: impl Into<String>,
        top_k: u32,
    ) -> Result<Self, ConfigError> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(ConfigError::Missing("PICARTA_API_TOKEN"));
        }
        Ok(Self {
            api_token,
            endpoint: endpoint.into(),
            top_k: top_k.max(1),
            timeout: None,
        })
    }

    /// Bound each request; reqwest's blocking client would otherwise default to 30s
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn from_config(config: &BotConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(&config.picarta_token, &config.picarta_url, config.top_k)?
            .with_timeout(config.picarta_timeout))
    }

    fn encode_image(image_path: &Path) -> Result<String, PredictError> {
        let bytes = std::fs::read(image_path).map_err(|e| {
            PredictError::InvalidImage(format!("{}: {}", image_path.display(), e))
        })?;
        if bytes.is_empty() {
            return Err(PredictError::InvalidImage(format!(
                "{}: file is empty",
                image_path.display()
            )));
        }
        Ok(BASE64.encode(bytes))
    }
}

impl Predictor for PicartaClient {
    fn localize(&self, image_path: &Path) -> Result<PredictionResult, PredictError> {
        let request = ClassifyRequest {
            token: &self.api_token,
            image: Self::encode_image(image_path)?,
            top_k: self.top_k,
        };

        // Built per call so the client lives and dies on the worker thread
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| PredictError::Transport(e.to_string()))?;

        debug!(endpoint = %self.endpoint, top_k = self.top_k, "Sending image to Picarta");

        let response = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| PredictError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PredictError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PredictError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let result: PredictionResult = response
            .json()
            .map_err(|e| PredictError::Decode(e.to_string()))?;

        info!(predictions = result.predictions.len(), "Picarta prediction completed");
        Ok(result)
    }
}
