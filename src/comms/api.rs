//! Axum handlers.
//!
//! Chat and NLP failures keep HTTP 200 and report `status: "error"` in the
//! body; only malformed requests are rejected by axum itself.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::chat::{Ack, ChatReply, ChatRouter, EntitiesReply, HistoryReply, IntentReply};

#[derive(Debug, Deserialize)]
pub(super) struct UserInput {
    /// Missing is treated the same as empty.
    #[serde(default)]
    user_input: Option<String>,
}

impl UserInput {
    fn text(&self) -> &str {
        self.user_input.as_deref().unwrap_or_default()
    }
}

/// GET /
pub(super) async fn home() -> Json<Value> {
    Json(json!({ "message": "QueryGenie chat service is running!" }))
}

/// POST /chat
pub(super) async fn chat(State(chat): State<Arc<ChatRouter>>, Query(params): Query<UserInput>) -> Json<ChatReply> {
    debug!(len = params.text().len(), "chat request");
    Json(chat.route(params.text()).await)
}

/// GET /chat/history
pub(super) async fn history(State(chat): State<Arc<ChatRouter>>) -> Json<HistoryReply> {
    Json(chat.history().await)
}

/// DELETE /chat/reset
pub(super) async fn reset(State(chat): State<Arc<ChatRouter>>) -> Json<Ack> {
    Json(chat.reset().await)
}

/// POST /nlp/intent
pub(super) async fn intent(State(chat): State<Arc<ChatRouter>>, Query(params): Query<UserInput>) -> Json<IntentReply> {
    Json(chat.intent(params.text()))
}

/// POST /nlp/entities
pub(super) async fn entities(
    State(chat): State<Arc<ChatRouter>>,
    Query(params): Query<UserInput>,
) -> Json<EntitiesReply> {
    Json(chat.entities(params.text()).await)
}
