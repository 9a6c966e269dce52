//! Conversation routing: history, reply payloads and the router itself.

pub mod history;
pub mod response;
pub mod router;

pub use history::{ConversationState, Role, Turn};
pub use response::{Ack, ChatReply, ChatResponse, EntitiesReply, ErrorBody, HistoryReply, IntentReply, Status};
pub use router::{ChatError, ChatRouter, select_domain};
