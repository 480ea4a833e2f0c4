//! # Configuration Module
//!
//! Runtime settings for the bot, read from environment variables
//! (optionally populated from a `.env` file by the binary).

use std::time::Duration;

use crate::errors::ConfigError;

pub const DEFAULT_PICARTA_URL: &str = "https://picarta.ai/classify";
pub const DEFAULT_TOP_K: u32 = 3;
pub const DEFAULT_LOG_FILE: &str = "bot.log";
pub const DEFAULT_MAX_CONCURRENT_PREDICTIONS: usize = 8;

/// Bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token
    pub telegram_token: String,
    /// Picarta API token
    pub picarta_token: String,
    /// Chat that receives startup and shutdown notices
    pub admin_chat_id: Option<i64>,
    /// Picarta classify endpoint
    pub picarta_url: String,
    /// Number of predictions requested per image
    pub top_k: u32,
    /// Per-request limit for Picarta calls; unset means no limit
    pub picarta_timeout: Option<Duration>,
    /// Append-only log file
    pub log_file: String,
    /// Upper bound on predictor calls running at once
    pub max_concurrent_predictions: usize,
}

impl BotConfig {
    /// Load the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let telegram_token = get("TELEGRAM_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;
        let picarta_token =
            get("PICARTA_API_TOKEN").ok_or(ConfigError::Missing("PICARTA_API_TOKEN"))?;

        let admin_chat_id = get("ADMIN_CHAT_ID")
            .map(|raw| {
                raw.parse::<i64>().map_err(|e| ConfigError::Invalid {
                    name: "ADMIN_CHAT_ID",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let top_k = parse_positive(get("PICARTA_TOP_K"), "PICARTA_TOP_K", DEFAULT_TOP_K)?;
        let max_concurrent_predictions = parse_positive(
            get("MAX_CONCURRENT_PREDICTIONS"),
            "MAX_CONCURRENT_PREDICTIONS",
            DEFAULT_MAX_CONCURRENT_PREDICTIONS,
        )?;
        let picarta_timeout = get("PICARTA_TIMEOUT_SECS")
            .map(|raw| parse_positive(Some(raw), "PICARTA_TIMEOUT_SECS", 1u64))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            telegram_token,
            picarta_token,
            admin_chat_id,
            picarta_url: get("PICARTA_API_URL").unwrap_or_else(|| DEFAULT_PICARTA_URL.to_string()),
            top_k,
            picarta_timeout,
            log_file: get("BOT_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            max_concurrent_predictions,
        })
    }
}

fn parse_positive<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
    T::Err: std::fmt::Display,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    if value < T::from(1) {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}
