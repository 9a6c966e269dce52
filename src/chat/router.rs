//! Intent routing and response composition.
//!
//! For each message the router either answers from one domain resolver
//! (state untouched) or asks the generative backend with the whole
//! conversation as context (state gains a user/assistant pair).

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::history::{ConversationState, Turn};
use super::response::{Ack, ChatReply, ChatResponse, EntitiesReply, ErrorBody, HistoryReply, IntentReply, Status};
use crate::config::{ChatConfig, Config};
use crate::error::AppError;
use crate::llm::{LlmProvider, ProviderError, providers};
use crate::nlp::{Classification, Classifier, EntityMap, Intent, NlpError};
use crate::resolvers::{Domain, Resolvers};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures inside `route`. Converted to an [`ErrorBody`] at the boundary.
/// Resolver failures are not here: they fall through to the generative
/// path and are reported as `api_error`.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Input cannot be empty.")]
    Validation,
    #[error("{0}")]
    Generative(#[from] ProviderError),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Validation => "validation",
            ChatError::Generative(_) => "generative",
            ChatError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<NlpError> for ChatError {
    fn from(e: NlpError) -> Self {
        ChatError::Unexpected(e.to_string())
    }
}

// ── Routing policy ────────────────────────────────────────────────────────────

/// Keyword hints checked against the lower-cased input, in priority order.
/// Information has no keywords; it is picked by intent alone.
pub const DOMAIN_HINTS: &[(Domain, &[&str])] = &[
    (Domain::Drug, &["medicine", "pill", "aspirin"]),
    (Domain::Finance, &["stock"]),
    (Domain::Book, &["book"]),
];

/// First domain whose hint matches, else `Information` for an information
/// intent, else none.
pub fn select_domain(text: &str, intent: Intent) -> Option<Domain> {
    let lower = text.to_lowercase();
    DOMAIN_HINTS
        .iter()
        .find(|(_, hints)| hints.iter().any(|h| lower.contains(h)))
        .map(|(domain, _)| *domain)
        .or_else(|| (intent == Intent::Information).then_some(Domain::Information))
}

/// Query used when no entity was extracted. `Information` has none.
pub fn default_query(domain: Domain) -> Option<&'static str> {
    match domain {
        Domain::Drug => Some("aspirin"),
        Domain::Finance => Some("AAPL"),
        Domain::Book => Some("Python"),
        Domain::Information => None,
    }
}

fn domain_query(domain: Domain, entities: &EntityMap) -> Option<String> {
    entities
        .first_value()
        .or_else(|| default_query(domain))
        .map(str::to_string)
}

// ── Router ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ChatRouter {
    classifier: Classifier,
    resolvers: Resolvers,
    llm: LlmProvider,
    /// Held across the whole generative step so turns stay paired.
    state: Mutex<ConversationState>,
    tail_len: usize,
    api_notice: String,
}

impl ChatRouter {
    pub fn new(classifier: Classifier, resolvers: Resolvers, llm: LlmProvider, chat: &ChatConfig) -> Self {
        Self {
            classifier,
            resolvers,
            llm,
            state: Mutex::new(ConversationState::new()),
            tail_len: chat.tail_len,
            api_notice: chat.api_notice.clone(),
        }
    }

    /// Wire every collaborator from resolved config.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let classifier = Classifier::from_config(&config.nlp).map_err(|e| AppError::Config(e.to_string()))?;
        let resolvers = Resolvers::from_config(&config.resolvers, config.alphavantage_api_key.clone())?;
        let llm = providers::build(&config.llm, config.llm_api_key.clone())
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self::new(classifier, resolvers, llm, &config.chat))
    }

    pub fn provider_name(&self) -> &'static str {
        self.llm.name()
    }

    pub fn resolver_backend(&self) -> &'static str {
        self.resolvers.name()
    }

    /// Route one message and fold any failure into an error payload.
    pub async fn route(&self, user_input: &str) -> ChatReply {
        match self.try_route(user_input).await {
            Ok(response) => ChatReply::Success(Box::new(response)),
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "chat route failed");
                ChatReply::Error(ErrorBody::new(e.kind(), e.to_string()))
            }
        }
    }

    pub async fn try_route(&self, user_input: &str) -> Result<ChatResponse, ChatError> {
        if user_input.trim().is_empty() {
            return Err(ChatError::Validation);
        }

        let Classification { intent, entities } = self.classifier.classify(user_input).await?;
        debug!(%intent, entities = entities.len(), "classified");

        let mut api_error = None;
        if let Some(domain) = select_domain(user_input, intent) {
            match domain_query(domain, &entities) {
                Some(query) => match self.resolvers.resolve(domain, &query).await {
                    Ok(record) => {
                        info!(%domain, %query, source = domain.source_label(), "answered from data API");
                        return Ok(ChatResponse {
                            status: Status::Success,
                            user_input: user_input.to_string(),
                            ai_response: self.api_notice.clone(),
                            api_response: Some(record),
                            api_source: Some(domain.source_label().to_string()),
                            api_error: None,
                            intent,
                            entities,
                            conversation_tail: None,
                        });
                    }
                    Err(e) => {
                        info!(%domain, %query, kind = e.kind(), "lookup failed, falling back to generative backend");
                        api_error = Some(e);
                    }
                },
                None => debug!(%domain, "no entity to look up"),
            }
        }

        let user_turn = Turn::user(user_input);
        let mut state = self.state.lock().await;
        let context = state.context_with(&user_turn);
        debug!(provider = self.llm.name(), turns = state.len() + 1, "asking generative backend");

        // State is only touched once the backend has answered.
        let reply = self.llm.complete(&context).await?;
        state.append(user_turn);
        state.append(Turn::assistant(reply.clone()));
        let tail = state.snapshot(self.tail_len);
        drop(state);

        Ok(ChatResponse {
            status: Status::Success,
            user_input: user_input.to_string(),
            ai_response: reply,
            api_response: None,
            api_source: None,
            api_error,
            intent,
            entities,
            conversation_tail: Some(tail),
        })
    }

    pub async fn history(&self) -> HistoryReply {
        let state = self.state.lock().await;
        if state.is_empty() {
            HistoryReply::Empty { status: Status::Error, message: "No conversation history found.".into() }
        } else {
            HistoryReply::Found { status: Status::Success, conversation_history: state.turns().to_vec() }
        }
    }

    pub async fn reset(&self) -> Ack {
        let mut state = self.state.lock().await;
        let dropped = state.len();
        state.clear();
        info!(dropped, "conversation history cleared");
        Ack { status: Status::Success, message: "Chat history cleared!".into() }
    }

    pub fn intent(&self, text: &str) -> IntentReply {
        IntentReply { status: Status::Success, intent: self.classifier.intent(text) }
    }

    pub async fn entities(&self, text: &str) -> EntitiesReply {
        match self.classifier.entities(text).await {
            Ok(entities) => EntitiesReply::Found { status: Status::Success, entities },
            Err(e) => {
                warn!(error = %e, "entity extraction failed");
                EntitiesReply::Error(ErrorBody::new("unexpected", e.to_string()))
            }
        }
    }

    #[cfg(test)]
    async fn turn_count(&self) -> usize {
        self.state.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chat::history::Role;
    use crate::resolvers::DomainRecord;

    fn router() -> ChatRouter {
        ChatRouter::from_config(&Config::offline()).unwrap()
    }

    fn failing_backend() -> ChatRouter {
        let mut config = Config::offline();
        config.llm.provider = "cohere".into();
        config.llm.cohere.api_base_url = "http://127.0.0.1:1/v1/chat".into();
        config.llm.cohere.timeout_seconds = 2;
        ChatRouter::from_config(&config).unwrap()
    }

    async fn ok(router: &ChatRouter, text: &str) -> ChatResponse {
        router.try_route(text).await.unwrap()
    }

    #[test]
    fn hint_order_is_fixed() {
        let order: Vec<Domain> = DOMAIN_HINTS.iter().map(|(d, _)| *d).collect();
        assert_eq!(order, vec![Domain::Drug, Domain::Finance, Domain::Book]);
    }

    #[test]
    fn drug_hint_beats_finance_and_book() {
        assert_eq!(select_domain("a book about aspirin stock", Intent::Booking), Some(Domain::Drug));
        assert_eq!(select_domain("stock in a book", Intent::Booking), Some(Domain::Finance));
    }

    #[test]
    fn information_only_by_intent() {
        assert_eq!(select_domain("Tell me about Rome", Intent::Information), Some(Domain::Information));
        assert_eq!(select_domain("Where is Rome", Intent::Question), None);
    }

    #[test]
    fn defaults_per_domain() {
        assert_eq!(default_query(Domain::Drug), Some("aspirin"));
        assert_eq!(default_query(Domain::Finance), Some("AAPL"));
        assert_eq!(default_query(Domain::Book), Some("Python"));
        assert_eq!(default_query(Domain::Information), None);
    }

    #[tokio::test]
    async fn drug_hint_without_entity_defaults_to_aspirin() {
        let r = router();
        let resp = ok(&r, "i need a pill for my headache").await;
        assert!(resp.entities.is_empty());
        match resp.api_response {
            Some(DomainRecord::Drug(info)) => assert_eq!(info.brand_name, "Aspirin"),
            other => panic!("expected drug record, got {other:?}"),
        }
        assert_eq!(resp.api_source.as_deref(), Some("OpenFDA API"));
        assert_eq!(resp.ai_response, "This information was retrieved from an external API.");
        assert_eq!(r.turn_count().await, 0);
    }

    #[tokio::test]
    async fn stock_without_company_falls_through() {
        let r = router();
        let resp = ok(&r, "what about the stock market").await;
        assert!(resp.api_response.is_none());
        assert_eq!(resp.api_error.as_ref().map(|e| e.kind()), Some("invalid_query"));
        assert_eq!(r.turn_count().await, 2);
        assert_eq!(resp.conversation_tail.as_ref().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn stock_with_company_answers_from_api() {
        let r = router();
        let resp = ok(&r, "What is the stock price of Tesla?").await;
        assert_eq!(resp.api_source.as_deref(), Some("Alpha Vantage API"));
        assert!(matches!(resp.api_response, Some(DomainRecord::Stock(ref q)) if q.symbol == "TSLA"));
        assert!(resp.conversation_tail.is_none());
    }

    #[tokio::test]
    async fn book_entity_used_as_title() {
        let r = router();
        let resp = ok(&r, "Find the book Dune").await;
        assert!(matches!(resp.api_response, Some(DomainRecord::Book(ref b)) if b.author == "Frank Herbert"));
    }

    #[tokio::test]
    async fn information_with_entity_uses_topic() {
        let r = router();
        let resp = ok(&r, "Tell me about Albert Einstein").await;
        assert_eq!(resp.intent, Intent::Information);
        assert_eq!(resp.api_source.as_deref(), Some("Wikipedia API"));
    }

    #[tokio::test]
    async fn information_without_entity_goes_generative() {
        let r = router();
        let resp = ok(&r, "what is love").await;
        assert!(resp.api_response.is_none());
        assert!(resp.api_error.is_none());
        assert_eq!(r.turn_count().await, 2);
    }

    #[tokio::test]
    async fn unknown_topic_reports_not_found() {
        let r = router();
        let resp = ok(&r, "Tell me about Atlantis").await;
        assert_eq!(resp.api_error.as_ref().map(|e| e.kind()), Some("not_found"));
        assert!(resp.ai_response.starts_with("[echo]"));
    }

    #[tokio::test]
    async fn blank_input_rejected_without_mutation() {
        let r = router();
        for text in ["", "   "] {
            let err = r.try_route(text).await.unwrap_err();
            assert_eq!(err.kind(), "validation");
        }
        assert_eq!(r.turn_count().await, 0);

        let reply = serde_json::to_value(r.route("").await).unwrap();
        assert_eq!(reply["message"], "Input cannot be empty.");
    }

    #[tokio::test]
    async fn context_carries_earlier_turns() {
        let r = router();
        ok(&r, "hello").await;
        let resp = ok(&r, "and again").await;
        assert_eq!(resp.ai_response, "[echo] user: hello\nassistant: [echo] user: hello\nuser: and again");
    }

    #[tokio::test]
    async fn tail_is_capped() {
        let r = router();
        for text in ["one", "two", "three"] {
            ok(&r, text).await;
        }
        let resp = ok(&r, "four").await;
        let tail = resp.conversation_tail.unwrap();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail.last().map(|t| t.role), Some(Role::Assistant));
        assert_eq!(r.turn_count().await, 8);
    }

    #[tokio::test]
    async fn backend_failure_leaves_history_unchanged() {
        let r = failing_backend();
        let reply = r.route("hello").await;
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "generative");
        assert_eq!(r.turn_count().await, 0);
    }

    #[tokio::test]
    async fn history_and_reset() {
        let r = router();
        assert!(matches!(r.history().await, HistoryReply::Empty { .. }));

        ok(&r, "hello").await;
        match r.history().await {
            HistoryReply::Found { conversation_history, .. } => assert_eq!(conversation_history.len(), 2),
            other => panic!("expected history, got {other:?}"),
        }

        assert_eq!(r.reset().await.message, "Chat history cleared!");
        assert_eq!(r.reset().await.status, Status::Success);
        assert!(matches!(r.history().await, HistoryReply::Empty { .. }));
    }

    #[tokio::test]
    async fn concurrent_routes_keep_turns_paired() {
        let r = Arc::new(router());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let r = r.clone();
                tokio::spawn(async move { r.try_route(&format!("message {i}")).await.is_ok() })
            })
            .collect();
        for h in handles {
            assert!(h.await.unwrap());
        }

        let HistoryReply::Found { conversation_history, .. } = r.history().await else {
            panic!("history should not be empty");
        };
        assert_eq!(conversation_history.len(), 16);
        for pair in conversation_history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert!(pair[1].content.ends_with(&pair[0].content));
        }
    }

    #[test]
    fn intent_reply() {
        assert_eq!(router().intent("bye now").intent, Intent::Goodbye);
    }

    #[tokio::test]
    async fn entities_reply() {
        let json = serde_json::to_value(router().entities("Tell me about Ada Lovelace").await).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["entities"]["PROPN"], "Ada Lovelace");
    }
}
