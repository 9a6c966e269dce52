//! Generative backend abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely
//! (`reqwest::Client` is reference-counted internally).

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("AI response is empty")]
    EmptyReply,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available generative backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new `complete` arm.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Cohere(providers::cohere::CohereProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `prompt` (the full conversation context) and return the reply
    /// text. A blank reply is reported as [`ProviderError::EmptyReply`].
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(prompt).await,
            LlmProvider::Cohere(p) => p.complete(prompt).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(prompt).await,
        }
    }

    /// Short label for logs and the startup summary.
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Cohere(_) => "cohere",
            LlmProvider::OpenAiCompatible(_) => "openai",
        }
    }
}

/// Trim a raw reply, rejecting blank text.
pub(crate) fn non_empty(text: Option<String>) -> Result<String, ProviderError> {
    text.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ProviderError::EmptyReply)
}
