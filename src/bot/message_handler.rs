//! Message Handler module for processing incoming Telegram messages

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, warn};

use crate::app::AppContext;
use crate::errors::PhotoError;
use crate::formatter::format_result;
use crate::localization::detect_language;
use crate::temp_store;
use crate::transport::{Incoming, PhotoEvent, PhotoVariant};

const FORMAT_DETECTION_BUFFER_SIZE: usize = 32;

/// Highest quality variant; Telegram orders sizes from smallest to largest
pub fn select_variant(variants: &[PhotoVariant]) -> Option<&PhotoVariant> {
    variants.last()
}

/// Check the leading bytes of a downloaded file against the formats the predictor accepts
pub async fn ensure_supported_image(path: &Path) -> Result<(), PhotoError> {
    let unreadable =
        |e: std::io::Error| PhotoError::UnsupportedFormat(format!("unreadable file: {e}"));
    let mut buffer = vec![0; FORMAT_DETECTION_BUFFER_SIZE];
    let mut file = File::open(path).await.map_err(unreadable)?;
    let bytes_read = file.read(&mut buffer).await.map_err(unreadable)?;
    buffer.truncate(bytes_read);

    match image::guess_format(&buffer) {
        Ok(
            format @ (image::ImageFormat::Jpeg
            | image::ImageFormat::Png
            | image::ImageFormat::WebP
            | image::ImageFormat::Bmp),
        ) => {
            debug!(format = ?format, "Detected supported image format");
            Ok(())
        }
        Ok(format) => Err(PhotoError::UnsupportedFormat(format!("{format:?}"))),
        Err(e) => Err(PhotoError::UnsupportedFormat(e.to_string())),
    }
}

/// Reply to `/start` (and `/help`) with the usage message
pub async fn handle_start(
    ctx: &AppContext,
    chat_id: i64,
    sender: &str,
    language_code: Option<&str>,
) -> Result<()> {
    info!(user_id = chat_id, sender = %sender, "Start command received");
    let lang = detect_language(language_code);
    ctx.transport
        .send_text(chat_id, &ctx.catalog.get("welcome", lang))
        .await?;
    Ok(())
}

/// Run the photo pipeline and reply with the predictions or a generic error.
///
/// The scratch file is released after the reply on every path.
pub async fn handle_photo(ctx: &AppContext, event: &PhotoEvent) -> Result<()> {
    let chat_id = event.chat_id;
    let lang = detect_language(event.language_code.as_deref());
    let generic_error = ctx.catalog.get("error-processing", lang);

    debug!(user_id = chat_id, sender = %event.sender, variants = event.variants.len(), "Received photo message from user");

    let Some(variant) = select_variant(&event.variants) else {
        warn!(user_id = chat_id, error = %PhotoError::NoVariants, "Photo processing skipped");
        ctx.transport.send_text(chat_id, &generic_error).await?;
        return Ok(());
    };

    let scratch = match temp_store::acquire(".jpg") {
        Ok(scratch) => scratch,
        Err(e) => {
            error!(user_id = chat_id, error = %PhotoError::Scratch(e), "Photo processing failed for user");
            ctx.transport.send_text(chat_id, &generic_error).await?;
            return Ok(());
        }
    };

    let reply = match process_photo(ctx, variant, scratch.path(), lang).await {
        Ok(text) => text,
        Err(e) => {
            error!(
                user_id = chat_id,
                file_id = %variant.file_id,
                error = %e,
                details = ?e,
                "Photo processing failed for user"
            );
            generic_error
        }
    };

    let sent = ctx.transport.send_text(chat_id, &reply).await;

    // Always clean up the temporary file
    temp_store::release(scratch);

    sent?;
    Ok(())
}

async fn process_photo(
    ctx: &AppContext,
    variant: &PhotoVariant,
    path: &Path,
    lang: &str,
) -> Result<String, PhotoError> {
    ctx.transport.download(&variant.file_id, path).await?;
    debug!(
        temp_path = %path.display(),
        width = variant.width,
        height = variant.height,
        file_size = variant.file_size,
        "Image downloaded"
    );

    ensure_supported_image(path).await?;

    let result = ctx.geo.predict(path).await?;
    info!(predictions = result.predictions.len(), "Geolocation completed");

    Ok(format_result(&result, &ctx.catalog, lang))
}

async fn handle_other(ctx: &AppContext, chat_id: i64, language_code: Option<&str>) -> Result<()> {
    debug!(user_id = chat_id, "Received unsupported message type from user");
    let lang = detect_language(language_code);
    ctx.transport
        .send_text(chat_id, &ctx.catalog.get("send-photo-hint", lang))
        .await?;
    Ok(())
}

/// Route a classified message to its handler
pub async fn dispatch(ctx: &AppContext, incoming: Incoming) -> Result<()> {
    match incoming {
        Incoming::Start {
            chat_id,
            sender,
            language_code,
        } => handle_start(ctx, chat_id, &sender, language_code.as_deref()).await,
        Incoming::Photo(event) => handle_photo(ctx, &event).await,
        Incoming::Other {
            chat_id,
            language_code,
        } => handle_other(ctx, chat_id, language_code.as_deref()).await,
    }
}

/// Teloxide endpoint
pub async fn message_handler(msg: Message, ctx: Arc<AppContext>) -> Result<()> {
    if let Err(e) = dispatch(&ctx, Incoming::from_message(&msg)).await {
        error!(user_id = msg.chat.id.0, error = %e, "Message handler failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn variant(file_id: &str) -> PhotoVariant {
        PhotoVariant {
            file_id: file_id.to_string(),
            width: 100,
            height: 100,
            file_size: 1000,
        }
    }

    #[test]
    fn test_select_variant_takes_last() {
        let variants = vec![variant("A"), variant("B"), variant("C")];
        assert_eq!(select_variant(&variants).unwrap().file_id, "C");
        assert!(select_variant(&[]).is_none());
    }

    #[tokio::test]
    async fn test_supported_image_formats() {
        let mut jpeg = NamedTempFile::new().unwrap();
        jpeg.write_all(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'])
            .unwrap();
        assert!(ensure_supported_image(jpeg.path()).await.is_ok());

        let mut png = NamedTempFile::new().unwrap();
        png.write_all(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();
        assert!(ensure_supported_image(png.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_or_missing_files_are_rejected() {
        let mut text = NamedTempFile::new().unwrap();
        text.write_all(b"plain text, not an image at all").unwrap();
        assert!(matches!(
            ensure_supported_image(text.path()).await,
            Err(PhotoError::UnsupportedFormat(_))
        ));

        let mut gif = NamedTempFile::new().unwrap();
        gif.write_all(b"GIF89a\x01\x00\x01\x00").unwrap();
        assert!(ensure_supported_image(gif.path()).await.is_err());

        assert!(ensure_supported_image(Path::new("/non/existent/file.jpg"))
            .await
            .is_err());
    }
}
