use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tgkit_core::{config::Config, Bot, ClassifiedUpdate, UpdateKind};

mod demo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tgkit_core::logging::init("tgkit")?;

    let cfg = Arc::new(Config::load()?);
    let bot = tgkit_telegram::router::build_bot(&cfg).await?;

    let handler_bot = bot.clone();
    bot.dispatcher().set_handler(move |update: ClassifiedUpdate| {
        let bot: Bot = handler_bot.clone();
        async move {
            let kind: UpdateKind = update.kind;
            if let Err(e) = demo::handle(&bot, update).await {
                tracing::warn!(?kind, error = %e, "demo handler failed");
            }
        }
    });

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
        }
        on_signal.cancel();
    });

    tgkit_telegram::router::run(cfg, bot, shutdown).await
}
