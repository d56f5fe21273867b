//! Keep-alive HTTP responder.
//!
//! Hosting platforms that sleep idle containers need a URL to poll; this
//! server answers it. It shares no state with the bot core.

use {
    axum::{Router, routing::get},
    tokio_util::sync::CancellationToken,
    tracing::info,
};

const KEEPALIVE_BODY: &str = "Bot is running 24/7!";

pub fn build_app() -> Router {
    Router::new()
        .route("/", get(keepalive_handler))
        .route("/health", get(keepalive_handler))
}

async fn keepalive_handler() -> &'static str {
    KEEPALIVE_BODY
}

/// Serve the keep-alive responder until `cancel` fires.
pub async fn serve(bind: &str, port: u16, cancel: CancellationToken) -> anyhow::Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, "keep-alive server listening");
    axum::serve(listener, build_app())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}
