//! # Geolocator Telegram Bot
//!
//! A Telegram bot that receives photos, asks the Picarta API where they were
//! taken, and replies with the predicted coordinates.

pub mod app;
pub mod bot;
pub mod config;
pub mod errors;
pub mod formatter;
pub mod geolocation;
pub mod localization;
pub mod logging;
pub mod picarta;
pub mod temp_store;
pub mod transport;
