//! Startup and shutdown hooks around the polling loop.

use std::future::Future;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::app::AppContext;
use crate::localization::DEFAULT_LANGUAGE;

async fn notify_admin(ctx: &AppContext, key: &str) {
    let Some(admin_chat_id) = ctx.admin_chat_id else {
        return;
    };
    let time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let text = ctx
        .catalog
        .get_with_args(key, &[("time", time.as_str())], DEFAULT_LANGUAGE);

    if let Err(e) = ctx.transport.send_text(admin_chat_id, &text).await {
        warn!(admin_chat_id, error = %e, "Failed to notify operator chat");
    }
}

/// Send the startup notice to the operator chat, if configured
pub async fn on_startup(ctx: &AppContext) {
    info!("Bot started");
    notify_admin(ctx, "bot-started").await;
}

/// Send the shutdown notice and release the transport session
pub async fn on_shutdown(ctx: &AppContext) {
    notify_admin(ctx, "bot-stopped").await;
    if let Err(e) = ctx.transport.close().await {
        warn!(error = %e, "Failed to release transport session");
    }
    info!("Bot stopped");
}

/// Run `polling` between the startup and shutdown hooks.
///
/// A polling error is logged as critical, the shutdown hook still runs, and
/// the error is returned to the caller.
pub async fn run<F>(ctx: &AppContext, polling: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    on_startup(ctx).await;

    let outcome = polling.await;
    if let Err(e) = &outcome {
        error!(severity = "CRITICAL", error = ?e, "Polling loop terminated with a fatal error");
    }

    on_shutdown(ctx).await;
    outcome
}
