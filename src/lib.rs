// Library root. The binary entry point is src/main.rs; integration tests
// under tests/ build against this crate.

mod core;

pub mod bootstrap;
pub mod chat;
pub mod comms;
pub mod llm;
pub mod nlp;
pub mod resolvers;

pub use crate::core::{config, error};
pub use bootstrap::logger;
