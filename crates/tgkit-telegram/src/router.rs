use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tgkit_core::{config::Config, transport::Transport, Bot, Dispatcher, KeyboardManager};

use crate::{polling, webhook, HttpTransport};

/// Build a `Bot` from config over the HTTP transport.
///
/// The bot username (used to strip `/cmd@bot` mentions) comes from config, or from
/// `getMe` when not configured.
pub async fn build_bot(cfg: &Config) -> anyhow::Result<Bot> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(cfg)?);
    build_bot_with(cfg, transport).await
}

pub async fn build_bot_with(cfg: &Config, transport: Arc<dyn Transport>) -> anyhow::Result<Bot> {
    let keyboards = Arc::new(KeyboardManager::with_default_columns(
        cfg.keyboard_max_columns,
    )?);

    let username = match &cfg.telegram_bot_username {
        Some(u) => u.clone(),
        None => {
            let identity = Bot::new(
                transport.clone(),
                keyboards.clone(),
                Arc::new(Dispatcher::new("")),
            );
            let me = identity.get_me().await?;
            me.username.unwrap_or_default()
        }
    };
    tracing::info!(username = %username, "bot identity resolved");

    let dispatcher =
        Arc::new(Dispatcher::new(username).with_max_concurrency(cfg.max_concurrent_handlers));
    Ok(Bot::new(transport, keyboards, dispatcher))
}

/// Feed updates into `bot`'s dispatcher until `shutdown` fires.
///
/// Webhook mode when a listen address is configured, long polling otherwise.
pub async fn run(cfg: Arc<Config>, bot: Bot, shutdown: CancellationToken) -> anyhow::Result<()> {
    match cfg.webhook_listen_addr {
        Some(addr) => {
            if let Some(url) = &cfg.webhook_url {
                bot.set_webhook(url, cfg.webhook_secret.as_deref()).await?;
                tracing::info!(url = %url, "webhook registered");
            }
            let app = webhook::router(
                bot.dispatcher().clone(),
                &cfg.webhook_path,
                cfg.webhook_secret.clone(),
            );
            webhook::serve(addr, app, shutdown).await
        }
        None => {
            // getUpdates is refused while a webhook is set.
            if let Err(e) = bot.delete_webhook().await {
                tracing::warn!(error = %e, "deleteWebhook failed");
            }
            polling::run_polling(bot, cfg.poll_timeout, shutdown).await
        }
    }
}
