//! Cohere chat provider (`POST /v1/chat`).
//!
//! The whole conversation is flattened into one `message` by the router, so
//! this adapter sends a single-turn request and reads back `text`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{ProviderError, non_empty};

#[derive(Debug, Clone)]
pub struct CohereProvider {
    client: Client,
    api_base_url: String,
    model: String,
    api_key: Option<String>,
}

impl CohereProvider {
    pub fn new(
        api_base_url: String,
        model: String,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, api_key })
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let payload = ChatRequest { message: prompt, model: &self.model };

        debug!(model = %self.model, prompt_len = prompt.len(), "sending cohere request");
        trace!(prompt = %prompt, "full cohere prompt");

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "cohere request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            let message = error_message(status, &body);
            error!(%status, %message, "cohere returned HTTP error");
            return Err(ProviderError::Request(message));
        }

        let parsed = response.json::<ChatResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize cohere response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        non_empty(parsed.text)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => format!("HTTP {status}: {}", err.message),
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape() {
        let body = serde_json::to_value(ChatRequest { message: "user: hi", model: "command-r" }).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "user: hi", "model": "command-r" }));
    }

    #[test]
    fn reply_text_extracted() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"text":" Hello there ","generation_id":"x"}"#).unwrap();
        assert_eq!(non_empty(parsed.text).unwrap(), "Hello there");
    }

    #[test]
    fn missing_text_is_empty_reply() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"generation_id":"x"}"#).unwrap();
        assert!(matches!(non_empty(parsed.text), Err(ProviderError::EmptyReply)));
    }

    #[test]
    fn error_envelope_message_used() {
        let msg = error_message(reqwest::StatusCode::UNAUTHORIZED, r#"{"message":"invalid api token"}"#);
        assert!(msg.contains("401"));
        assert!(msg.contains("invalid api token"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        let p = CohereProvider::new("http://127.0.0.1:1/v1/chat".into(), "command-r".into(), 2, None).unwrap();
        assert!(matches!(p.complete("user: hi").await, Err(ProviderError::Request(_))));
    }
}
