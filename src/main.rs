use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::info;

use geolocator_bot::app::AppContext;
use geolocator_bot::bot;
use geolocator_bot::config::BotConfig;
use geolocator_bot::logging::init_tracing;
use geolocator_bot::picarta::PicartaClient;
use geolocator_bot::transport::TelegramTransport;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(&config.log_file)?;

    info!("Starting Geolocator Telegram Bot");

    let bot = Bot::new(&config.telegram_token);
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let predictor = Arc::new(PicartaClient::from_config(&config)?);
    let ctx = Arc::new(AppContext::new(
        transport,
        predictor,
        config.admin_chat_id,
        config.max_concurrent_predictions,
    )?);

    info!("Bot initialized, starting dispatcher");

    let handler = Update::filter_message().endpoint(bot::message_handler);
    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![Arc::clone(&ctx)])
        .enable_ctrlc_handler()
        .build();

    // A panic inside the dispatcher surfaces as a join error instead of unwinding past the hooks
    let polling = async move {
        tokio::spawn(async move { dispatcher.dispatch().await })
            .await
            .map_err(|e| anyhow::anyhow!("polling loop aborted: {e}"))
    };

    bot::run(&ctx, polling).await
}
