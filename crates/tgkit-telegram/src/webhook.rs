use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use tgkit_core::Dispatcher;

/// Header Telegram sets when `setWebhook` was called with a `secret_token`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

struct WebhookState {
    dispatcher: Arc<Dispatcher>,
    secret: Option<String>,
}

/// `POST <path>` takes webhook deliveries; `GET /health` answers `ok`.
///
/// Deliveries are acknowledged with 200 as soon as they are handed off or dropped.
pub fn router(dispatcher: Arc<Dispatcher>, path: &str, secret: Option<String>) -> Router {
    let state = Arc::new(WebhookState { dispatcher, secret });

    Router::new()
        .route(path, post(receive_update))
        .route("/health", get(health))
        .with_state(state)
}

async fn receive_update(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = &state.secret {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(secret.as_str()) {
            tracing::warn!("webhook delivery with missing or wrong secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    // Failures are logged by the dispatcher; the delivery is still consumed.
    let _ = state.dispatcher.dispatch_payload(&body);
    StatusCode::OK
}

async fn health() -> &'static str {
    "ok"
}

pub async fn serve(
    addr: SocketAddr,
    app: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
