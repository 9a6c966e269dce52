//! Named-entity extraction.
//!
//! Two recognizer backends share one output type, [`EntityMap`]:
//!
//! - **gazetteer**: built in, no I/O. Known organisations and drug names
//!   are tagged from fixed lists; other capitalised word runs that do not
//!   open a sentence are tagged `PROPN`.
//! - **remote**: posts the text to an NER service that answers
//!   `{"ents": [{"label": "...", "text": "..."}]}`.

use std::time::Duration;

use reqwest::Client;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::NlpError;
use crate::resolvers::stock::STOCK_SYMBOLS;

// ── EntityMap ─────────────────────────────────────────────────────────────────

/// Entity label → surface text.
///
/// Behaves like an insertion-ordered dict: re-inserting a label replaces the
/// text but keeps the label's original position. [`first_value`] is only a
/// convenience default for callers that need "some entity".
///
/// [`first_value`]: EntityMap::first_value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMap {
    entries: Vec<(String, String)>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, text: impl Into<String>) {
        let label = label.into();
        let text = text.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((label, text)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, t)| t.as_str())
    }

    pub fn first_value(&self) -> Option<&str> {
        self.entries.first().map(|(_, t)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }
}

impl Serialize for EntityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, text) in &self.entries {
            map.serialize_entry(label, text)?;
        }
        map.end()
    }
}

// ── Recognizer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum EntityRecognizer {
    Gazetteer(GazetteerRecognizer),
    Remote(RemoteRecognizer),
}

impl EntityRecognizer {
    pub async fn extract(&self, text: &str) -> Result<EntityMap, NlpError> {
        match self {
            EntityRecognizer::Gazetteer(r) => Ok(r.extract(text)),
            EntityRecognizer::Remote(r) => r.extract(text).await,
        }
    }
}

// ── Gazetteer ─────────────────────────────────────────────────────────────────

pub const LABEL_ORG: &str = "ORG";
pub const LABEL_PRODUCT: &str = "PRODUCT";
pub const LABEL_PROPN: &str = "PROPN";

/// Drug brand and generic names recognised without a model.
const KNOWN_DRUGS: &[&str] = &[
    "aspirin", "ibuprofen", "acetaminophen", "paracetamol", "naproxen", "tylenol",
    "advil", "motrin", "aleve", "benadryl", "claritin", "zyrtec", "nexium", "lipitor",
];

/// Capitalised tokens that never start an entity.
const STOP_WORDS: &[&str] = &["I", "I'm", "I'd", "I've", "I'll", "OK", "Please", "Thanks"];

#[derive(Debug, Clone, Default)]
pub struct GazetteerRecognizer;

impl GazetteerRecognizer {
    pub fn extract(&self, text: &str) -> EntityMap {
        let mut entities = EntityMap::new();
        let mut run: Vec<&str> = Vec::new();
        let mut sentence_start = true;

        for raw in text.split_whitespace() {
            let token = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-');
            let ends_sentence = raw.ends_with(['.', '!', '?']);

            if token.is_empty() {
                flush_run(&mut run, &mut entities);
                sentence_start = ends_sentence || sentence_start;
                continue;
            }

            if let Some(org) = known_org(token) {
                flush_run(&mut run, &mut entities);
                entities.insert(LABEL_ORG, org);
            } else if KNOWN_DRUGS.iter().any(|d| d.eq_ignore_ascii_case(token)) {
                flush_run(&mut run, &mut entities);
                entities.insert(LABEL_PRODUCT, token.to_lowercase());
            } else if is_capitalised(token) && !sentence_start && !STOP_WORDS.contains(&token) {
                run.push(token);
            } else {
                flush_run(&mut run, &mut entities);
            }

            if ends_sentence {
                flush_run(&mut run, &mut entities);
            }
            sentence_start = ends_sentence;
        }
        flush_run(&mut run, &mut entities);

        debug!(count = entities.len(), "gazetteer entities extracted");
        entities
    }
}

fn known_org(token: &str) -> Option<&'static str> {
    STOCK_SYMBOLS
        .iter()
        .find(|(company, _)| company.eq_ignore_ascii_case(token))
        .map(|(company, _)| *company)
}

fn is_capitalised(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}

fn flush_run(run: &mut Vec<&str>, entities: &mut EntityMap) {
    if !run.is_empty() {
        entities.insert(LABEL_PROPN, run.join(" "));
        run.clear();
    }
}

// ── Remote ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RemoteRecognizer {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct RemoteRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    ents: Vec<RemoteEntity>,
}

#[derive(Deserialize)]
struct RemoteEntity {
    label: String,
    text: String,
}

impl RemoteRecognizer {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self, NlpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| NlpError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub async fn extract(&self, text: &str) -> Result<EntityMap, NlpError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RemoteRequest { text })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(endpoint = %self.endpoint, error = %e, "entity recognizer request failed");
                NlpError(format!("entity recognizer unavailable: {e}"))
            })?;

        let parsed = response
            .json::<RemoteResponse>()
            .await
            .map_err(|e| NlpError(format!("malformed entity recognizer reply: {e}")))?;

        Ok(collect_remote(parsed))
    }
}

fn collect_remote(parsed: RemoteResponse) -> EntityMap {
    let mut entities = EntityMap::new();
    for ent in parsed.ents {
        entities.insert(ent.label, ent.text);
    }
    entities
}
