//! Domain resolvers: narrow factual lookups against external data APIs.
//!
//! Four domains, one source each:
//!
//! | domain      | source              | module    |
//! |-------------|---------------------|-----------|
//! | drug        | OpenFDA drug labels | [`drug`]  |
//! | finance     | Alpha Vantage quote | [`stock`] |
//! | book        | Open Library search | [`book`]  |
//! | information | Wikipedia summary   | [`topic`] |
//!
//! Every lookup returns a typed record or a [`ResolveError`] whose variant
//! separates "no such data" from "source unreachable" from "bad query".
//! [`Resolvers`] dispatches to the live HTTP backend or to the built-in
//! [`fixture`] table.

pub mod book;
pub mod drug;
pub mod fixture;
pub mod stock;
pub mod topic;

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ResolversConfig;
use crate::error::AppError;

pub use book::BookInfo;
pub use drug::DrugInfo;
pub use stock::StockQuote;
pub use topic::TopicSummary;

// ── Domain ────────────────────────────────────────────────────────────────────

/// Data-source categories the router can pick, in routing priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Drug,
    Finance,
    Book,
    Information,
}

impl Domain {
    /// Label reported as `api_source` when this domain answers.
    pub fn source_label(self) -> &'static str {
        match self {
            Domain::Drug => "OpenFDA API",
            Domain::Finance => "Alpha Vantage API",
            Domain::Book => "Open Library API",
            Domain::Information => "Wikipedia API",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Domain::Drug => "drug",
            Domain::Finance => "finance",
            Domain::Book => "book",
            Domain::Information => "information",
        })
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// A text-or-number field; upstream APIs mix the two.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(i64),
    Text(String),
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

/// Successful lookup. Serialises as the bare record object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainRecord {
    Drug(DrugInfo),
    Stock(StockQuote),
    Book(BookInfo),
    Topic(TopicSummary),
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The source answered but holds nothing for the query.
    #[error("{0}")]
    NotFound(String),
    /// Transport failure, timeout, non-2xx status or undecodable body.
    #[error("{0}")]
    Unavailable(String),
    /// The query cannot be sent (blank, or no stock symbol for it).
    #[error("{0}")]
    InvalidQuery(String),
}

impl ResolveError {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::NotFound(_) => "not_found",
            ResolveError::Unavailable(_) => "unavailable",
            ResolveError::InvalidQuery(_) => "invalid_query",
        }
    }
}

impl Serialize for ResolveError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            kind: &'a str,
            message: String,
        }
        Wire { kind: self.kind(), message: self.to_string() }.serialize(serializer)
    }
}

pub type ResolveResult = Result<DomainRecord, ResolveError>;

// ── Dispatch ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Resolvers {
    Http(HttpResolvers),
    Fixture(fixture::FixtureResolvers),
}

impl Resolvers {
    /// Build from `[resolvers]` config. `alphavantage_key` comes from env.
    pub fn from_config(config: &ResolversConfig, alphavantage_key: String) -> Result<Self, AppError> {
        match config.backend.as_str() {
            "http" => Ok(Resolvers::Http(HttpResolvers::new(config, alphavantage_key)?)),
            "fixture" => Ok(Resolvers::Fixture(fixture::FixtureResolvers::new(config.summary_limit))),
            other => Err(AppError::Config(format!("unknown resolver backend: {other}"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resolvers::Http(_) => "http",
            Resolvers::Fixture(_) => "fixture",
        }
    }

    /// Look `query` up in the source for `domain`.
    pub async fn resolve(&self, domain: Domain, query: &str) -> ResolveResult {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::InvalidQuery(format!("empty {domain} query")));
        }
        debug!(%domain, %query, backend = self.name(), "resolving");
        let result = match domain {
            Domain::Drug => self.drug(query).await.map(DomainRecord::Drug),
            Domain::Finance => self.stock(query).await.map(DomainRecord::Stock),
            Domain::Book => self.book(query).await.map(DomainRecord::Book),
            Domain::Information => self.topic(query).await.map(DomainRecord::Topic),
        };
        if let Err(e) = &result {
            debug!(%domain, kind = e.kind(), error = %e, "resolution failed");
        }
        result
    }

    pub async fn drug(&self, name: &str) -> Result<DrugInfo, ResolveError> {
        match self {
            Resolvers::Http(h) => drug::fetch(&h.client, &h.openfda_base_url, name).await,
            Resolvers::Fixture(f) => f.drug(name),
        }
    }

    /// `query` is free text (company name); the symbol is looked up first
    /// and an unknown company fails without any network call.
    pub async fn stock(&self, query: &str) -> Result<StockQuote, ResolveError> {
        let symbol = stock::symbol_for(query).ok_or_else(stock::unknown_symbol)?;
        match self {
            Resolvers::Http(h) => {
                stock::fetch(&h.client, &h.alphavantage_base_url, &h.alphavantage_key, symbol).await
            }
            Resolvers::Fixture(f) => f.stock(symbol),
        }
    }

    pub async fn book(&self, title: &str) -> Result<BookInfo, ResolveError> {
        match self {
            Resolvers::Http(h) => book::fetch(&h.client, &h.openlibrary_base_url, title).await,
            Resolvers::Fixture(f) => f.book(title),
        }
    }

    pub async fn topic(&self, topic: &str) -> Result<TopicSummary, ResolveError> {
        match self {
            Resolvers::Http(h) => {
                topic::fetch(&h.client, &h.wikipedia_base_url, topic, h.summary_limit).await
            }
            Resolvers::Fixture(f) => f.topic(topic),
        }
    }
}

// ── HTTP backend ──────────────────────────────────────────────────────────────

/// Live backend. One shared `reqwest::Client` carries the timeout and
/// user agent for every source.
#[derive(Debug, Clone)]
pub struct HttpResolvers {
    client: Client,
    openfda_base_url: String,
    alphavantage_base_url: String,
    alphavantage_key: String,
    openlibrary_base_url: String,
    wikipedia_base_url: String,
    summary_limit: usize,
}

impl HttpResolvers {
    pub fn new(config: &ResolversConfig, alphavantage_key: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Config(format!("failed to build resolver HTTP client: {e}")))?;

        Ok(Self {
            client,
            openfda_base_url: config.openfda_base_url.clone(),
            alphavantage_base_url: config.alphavantage_base_url.clone(),
            alphavantage_key,
            openlibrary_base_url: config.openlibrary_base_url.clone(),
            wikipedia_base_url: config.wikipedia_base_url.clone(),
            summary_limit: config.summary_limit,
        })
    }
}

/// Send `req`. `Ok(None)` means the source answered 404; other non-2xx
/// statuses and transport failures are [`ResolveError::Unavailable`].
pub(crate) async fn send(req: RequestBuilder, source: &str) -> Result<Option<Response>, ResolveError> {
    let response = req.send().await.map_err(|e| {
        warn!(%source, error = %e, timeout = e.is_timeout(), "resolver request failed (transport)");
        ResolveError::Unavailable(format!("{source} unreachable: {e}"))
    })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        warn!(%source, %status, "resolver returned HTTP error");
        return Err(ResolveError::Unavailable(format!("{source} returned HTTP {status}")));
    }
    Ok(Some(response))
}

/// Decode a JSON body into `T`, mapping failures to `Unavailable`.
pub(crate) async fn decode<T: serde::de::DeserializeOwned>(response: Response, source: &str) -> Result<T, ResolveError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ResolveError::Unavailable(format!("{source} sent an unreadable reply: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn fixture() -> Resolvers {
        Resolvers::from_config(&Config::offline().resolvers, "demo".into()).unwrap()
    }

    #[test]
    fn error_kinds_are_distinct() {
        assert_eq!(ResolveError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(ResolveError::Unavailable("x".into()).kind(), "unavailable");
        assert_eq!(ResolveError::InvalidQuery("x".into()).kind(), "invalid_query");
    }

    #[test]
    fn error_serializes_with_kind() {
        let json = serde_json::to_value(ResolveError::NotFound("Book not found.".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "not_found", "message": "Book not found." }));
    }

    #[test]
    fn source_labels() {
        assert_eq!(Domain::Drug.source_label(), "OpenFDA API");
        assert_eq!(Domain::Finance.source_label(), "Alpha Vantage API");
        assert_eq!(Domain::Book.source_label(), "Open Library API");
        assert_eq!(Domain::Information.source_label(), "Wikipedia API");
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut cfg = Config::offline().resolvers;
        cfg.backend = "ftp".into();
        assert!(Resolvers::from_config(&cfg, String::new()).is_err());
    }

    #[tokio::test]
    async fn blank_query_is_invalid() {
        let err = fixture().resolve(Domain::Book, "   ").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_query");
    }

    #[tokio::test]
    async fn unknown_company_fails_before_network() {
        // Live backend pointed nowhere: an unknown company must not reach it.
        let mut cfg = Config::offline().resolvers;
        cfg.backend = "http".into();
        cfg.alphavantage_base_url = "http://127.0.0.1:1".into();
        let live = Resolvers::from_config(&cfg, "demo".into()).unwrap();
        let err = live.resolve(Domain::Finance, "Acme Widgets").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn unreachable_source_is_unavailable() {
        let mut cfg = Config::offline().resolvers;
        cfg.backend = "http".into();
        cfg.openlibrary_base_url = "http://127.0.0.1:1".into();
        cfg.timeout_seconds = 2;
        let live = Resolvers::from_config(&cfg, "demo".into()).unwrap();
        let err = live.resolve(Domain::Book, "Dune").await.unwrap_err();
        assert!(matches!(err, ResolveError::Unavailable(_)));
    }

    #[tokio::test]
    async fn record_serializes_flat() {
        let record = fixture().resolve(Domain::Finance, "Tesla").await.unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Symbol"], "TSLA");
    }
}
