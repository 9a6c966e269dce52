//! Dummy provider: echoes the prompt back prefixed with `[echo]`.
//! Lets the full chat path run without an API key or network.

use crate::llm::ProviderError;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        Ok(format!("[echo] {prompt}"))
    }
}
