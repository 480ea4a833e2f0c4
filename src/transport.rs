//! # Transport Module
//!
//! The chat transport boundary: the [`Transport`] trait used by the handlers,
//! the transport-neutral event types, and the teloxide implementation.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::TransportError;

/// One size variant of an incoming photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u32,
}

/// A received photo message
#[derive(Debug, Clone)]
pub struct PhotoEvent {
    pub chat_id: i64,
    pub sender: String,
    pub language_code: Option<String>,
    /// Ordered from lowest to highest quality
    pub variants: Vec<PhotoVariant>,
}

/// Incoming message, classified for routing
#[derive(Debug, Clone)]
pub enum Incoming {
    Start {
        chat_id: i64,
        sender: String,
        language_code: Option<String>,
    },
    Photo(PhotoEvent),
    Other {
        chat_id: i64,
        language_code: Option<String>,
    },
}

impl Incoming {
    /// Classify a Telegram message
    pub fn from_message(msg: &Message) -> Self {
        let chat_id = msg.chat.id.0;
        let language_code = msg.from.as_ref().and_then(|user| user.language_code.clone());
        let sender = msg
            .from
            .as_ref()
            .map(|user| match &user.username {
                Some(username) => format!("@{username}"),
                None => user.first_name.clone(),
            })
            .unwrap_or_else(|| "unknown".to_string());

        if let Some(photos) = msg.photo() {
            let variants = photos
                .iter()
                .map(|photo| PhotoVariant {
                    file_id: photo.file.id.0.clone(),
                    width: photo.width,
                    height: photo.height,
                    file_size: photo.file.size,
                })
                .collect();
            return Incoming::Photo(PhotoEvent {
                chat_id,
                sender,
                language_code,
                variants,
            });
        }

        if msg.text().is_some_and(is_start_command) {
            return Incoming::Start {
                chat_id,
                sender,
                language_code,
            };
        }

        Incoming::Other {
            chat_id,
            language_code,
        }
    }
}

/// `/start` and `/help`, with or without a `@botname` suffix or arguments
pub fn is_start_command(text: &str) -> bool {
    let Some(command) = text.split_whitespace().next() else {
        return false;
    };
    let command = command.split('@').next().unwrap_or(command);
    matches!(command, "/start" | "/help")
}

/// Chat transport used by the handlers
#[async_trait]
pub trait Transport: Send + Sync {
    /// Download the remote file `file_id` into `dest`
    async fn download(&self, file_id: &str, dest: &Path) -> Result<(), TransportError>;
    /// Send a plain text message
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;
    /// Release the session; later calls fail with [`TransportError::Closed`]
    async fn close(&self) -> Result<(), TransportError>;
}

/// Teloxide-backed [`Transport`]
pub struct TelegramTransport {
    bot: Bot,
    closed: AtomicBool,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn download(&self, file_id: &str, dest: &Path) -> Result<(), TransportError> {
        self.ensure_open()?;

        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(|e| TransportError::Download(e.to_string()))?;

        let mut dst = tokio::fs::File::create(dest).await?;
        self.bot
            .download_file(&file.path, &mut dst)
            .await
            .map_err(|e| TransportError::Download(e.to_string()))?;
        dst.flush().await?;

        debug!(file_id = %file_id, dest = %dest.display(), "File downloaded");
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.ensure_open()?;

        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Telegram transport session released");
        }
        Ok(())
    }
}
