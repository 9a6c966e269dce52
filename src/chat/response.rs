//! Reply payloads returned by [`ChatRouter`](super::ChatRouter).
//!
//! Every payload carries `status: "success" | "error"`; errors never leave
//! the router as anything but an [`ErrorBody`].

use serde::Serialize;

use super::history::Turn;
use crate::nlp::{EntityMap, Intent};
use crate::resolvers::{DomainRecord, ResolveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Result of one `route` call.
///
/// Domain path: `api_response` + `api_source` set, `ai_response` is the
/// configured notice. Generative path: `ai_response` is the model reply,
/// `api_response` is null and the recent history is attached.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub status: Status,
    pub user_input: String,
    pub ai_response: String,
    pub api_response: Option<DomainRecord>,
    pub api_source: Option<String>,
    /// Set when a domain was picked but its lookup failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_error: Option<ResolveError>,
    pub intent: Intent,
    pub entities: EntityMap,
    #[serde(rename = "conversation_history", skip_serializing_if = "Option::is_none")]
    pub conversation_tail: Option<Vec<Turn>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub status: Status,
    pub kind: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status: Status::Error, kind: kind.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChatReply {
    Success(Box<ChatResponse>),
    Error(ErrorBody),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HistoryReply {
    Found { status: Status, conversation_history: Vec<Turn> },
    Empty { status: Status, message: String },
}

/// Plain `{status, message}` acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    pub status: Status,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntentReply {
    pub status: Status,
    pub intent: Intent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EntitiesReply {
    Found { status: Status, entities: EntityMap },
    Error(ErrorBody),
}
