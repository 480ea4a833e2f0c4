//! # Error Types Module
//!
//! This module defines the error types shared across the bot: configuration
//! loading, the chat transport, and the photo processing pipeline.
//! Predictor failures live next to the predictor in [`crate::geolocation`].

use thiserror::Error;

use crate::geolocation::PredictError;

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    /// A variable is set but cannot be parsed
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Errors raised by the chat transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// Retrieving a remote file failed
    #[error("file download failed: {0}")]
    Download(String),
    /// Delivering a message failed
    #[error("send failed: {0}")]
    Send(String),
    /// The session has already been released
    #[error("transport session is closed")]
    Closed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from one run of the photo pipeline.
///
/// These are logged with full detail and never shown to the user.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// The event carried no photo variants
    #[error("photo message has no size variants")]
    NoVariants,
    /// Scratch file could not be created
    #[error("could not create scratch file: {0}")]
    Scratch(#[source] std::io::Error),
    #[error(transparent)]
    Download(#[from] TransportError),
    /// Downloaded bytes are not an image format the predictor accepts
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Prediction(#[from] PredictError),
}
