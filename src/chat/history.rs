//! In-memory conversation log.
//!
//! Append and clear are the only mutations. The log itself has no locking;
//! [`ChatRouter`](super::ChatRouter) owns it behind a mutex.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        })
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The last `n` turns in original order; all of them if fewer exist.
    pub fn snapshot(&self, n: usize) -> Vec<Turn> {
        let start = self.turns.len().saturating_sub(n);
        self.turns[start..].to_vec()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Flatten the log plus a not-yet-appended `pending` turn into
    /// `role: content` lines.
    pub fn context_with(&self, pending: &Turn) -> String {
        self.turns
            .iter()
            .chain(std::iter::once(pending))
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> ConversationState {
        let mut s = ConversationState::new();
        s.append(Turn::user("hi"));
        s.append(Turn::assistant("hello"));
        s.append(Turn::user("how are you"));
        s
    }

    #[test]
    fn snapshot_shorter_than_n_returns_all() {
        let s = three();
        assert_eq!(s.snapshot(5), s.turns().to_vec());
    }

    #[test]
    fn snapshot_keeps_the_tail_in_order() {
        let s = three();
        let tail = s.snapshot(2);
        assert_eq!(tail, vec![Turn::assistant("hello"), Turn::user("how are you")]);
        assert!(s.snapshot(0).is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut s = three();
        s.clear();
        s.clear();
        assert!(s.is_empty());
    }

    #[test]
    fn context_lines_include_pending_turn() {
        let mut s = ConversationState::new();
        s.append(Turn::user("hi"));
        s.append(Turn::assistant("hello"));
        assert_eq!(s.context_with(&Turn::user("bye")), "user: hi\nassistant: hello\nuser: bye");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn turn_serializes_lowercase_role() {
        let json = serde_json::to_value(Turn::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "assistant", "content": "ok" }));
    }
}
