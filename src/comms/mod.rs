//! Inbound channels: the axum HTTP API and the optional console.
//!
//! ## URL layout
//!
//! ```text
//! GET    /                          health message
//! POST   /chat?user_input=<text>    route one message
//! GET    /chat/history              full conversation
//! DELETE /chat/reset                clear conversation
//! POST   /nlp/intent?user_input=    intent only
//! POST   /nlp/entities?user_input=  entities only
//! ```
//!
//! Every channel shares one [`ChatRouter`] and one [`CancellationToken`];
//! cancelling the token drains the HTTP server and stops the console.

mod api;
pub mod pty;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::chat::ChatRouter;
use crate::error::AppError;

/// Build the HTTP router. Public so integration tests can drive it with
/// `tower::ServiceExt::oneshot`.
pub fn build_router(chat: Arc<ChatRouter>) -> Router {
    Router::new()
        .route("/",              get(api::home))
        .route("/chat",          post(api::chat))
        .route("/chat/history",  get(api::history))
        .route("/chat/reset",    delete(api::reset))
        .route("/nlp/intent",    post(api::intent))
        .route("/nlp/entities",  post(api::entities))
        .layer(TraceLayer::new_for_http())
        .with_state(chat)
}

/// Serve the HTTP API on `bind_addr` until `shutdown` is cancelled.
pub async fn run_http(bind_addr: &str, chat: Arc<ChatRouter>, shutdown: CancellationToken) -> Result<(), AppError> {
    let router = build_router(chat);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "chat api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("http server error: {e}")))?;

    info!("chat api shut down");
    Ok(())
}

/// Run every configured channel. The console (when enabled) cancels
/// `shutdown` on exit so the HTTP server follows it down.
pub async fn run(
    bind_addr: &str,
    chat: Arc<ChatRouter>,
    interactive: bool,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    if !interactive {
        return run_http(bind_addr, chat, shutdown).await;
    }

    let console = {
        let chat = chat.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let result = pty::run_console(chat, shutdown.clone()).await;
            shutdown.cancel();
            result
        })
    };

    let http = run_http(bind_addr, chat, shutdown.clone()).await;
    // A failed HTTP bind must not leave the console blocked on stdin.
    shutdown.cancel();

    let console = console
        .await
        .map_err(|e| AppError::Comms(format!("console task failed: {e}")))?;
    http.and(console)
}
