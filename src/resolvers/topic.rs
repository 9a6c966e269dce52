//! Wikipedia page summary via the REST `page/summary` endpoint.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::{ResolveError, decode, send};

const SOURCE: &str = "Wikipedia";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicSummary {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Summary")]
    pub summary: String,
}

pub(crate) fn not_found(topic: &str) -> ResolveError {
    ResolveError::NotFound(format!("No Wikipedia page found for '{topic}'. Try a more specific term."))
}

pub(crate) async fn fetch(
    client: &Client,
    base_url: &str,
    topic: &str,
    summary_limit: usize,
) -> Result<TopicSummary, ResolveError> {
    let url = summary_url(base_url, topic)?;

    let Some(response) = send(client.get(url), SOURCE).await? else {
        return Err(not_found(topic));
    };
    let wire: SummaryResponse = decode(response, SOURCE).await?;
    from_wire(wire, topic, summary_limit)
}

/// `{base}/page/summary/{Page_Title}`, with the title percent-encoded as a
/// single path segment.
fn summary_url(base_url: &str, topic: &str) -> Result<Url, ResolveError> {
    let invalid = || ResolveError::InvalidQuery(format!("cannot build {SOURCE} URL from base {base_url}"));
    let mut url = Url::parse(base_url).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(["page", "summary"])
        .push(&topic.replace(' ', "_"));
    Ok(url)
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SummaryResponse {
    title: Option<String>,
    #[serde(default)]
    extract: String,
}

pub(crate) fn from_wire(wire: SummaryResponse, topic: &str, summary_limit: usize) -> Result<TopicSummary, ResolveError> {
    if wire.extract.trim().is_empty() {
        return Err(not_found(topic));
    }
    Ok(TopicSummary {
        title: wire.title.unwrap_or_else(|| topic.to_string()),
        summary: truncate_chars(&wire.extract, summary_limit),
    })
}

/// First `limit` characters of `text`.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_title_as_one_segment() {
        let url = summary_url("https://en.wikipedia.org/api/rest_v1", "Albert Einstein").unwrap();
        assert_eq!(url.as_str(), "https://en.wikipedia.org/api/rest_v1/page/summary/Albert_Einstein");

        let url = summary_url("https://en.wikipedia.org/api/rest_v1", "AC/DC").unwrap();
        assert_eq!(url.as_str(), "https://en.wikipedia.org/api/rest_v1/page/summary/AC%2FDC");
    }

    #[test]
    fn bad_base_url_rejected() {
        assert!(summary_url("not a url", "Rust").is_err());
    }

    #[test]
    fn summary_truncated_to_limit() {
        let wire = SummaryResponse { title: Some("Rust".into()), extract: "x".repeat(800) };
        let summary = from_wire(wire, "Rust", 500).unwrap();
        assert_eq!(summary.summary.chars().count(), 500);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("Zürich ist schön", 3), "Zür");
        assert_eq!(truncate_chars("short", 500), "short");
    }

    #[test]
    fn empty_extract_is_not_found() {
        let wire = SummaryResponse { title: Some("Qwzx".into()), extract: String::new() };
        let err = from_wire(wire, "Qwzx", 500).unwrap_err();
        assert_eq!(err.to_string(), "No Wikipedia page found for 'Qwzx'. Try a more specific term.");
    }

    #[test]
    fn page_title_preferred_over_query() {
        let wire: SummaryResponse =
            serde_json::from_str(r#"{"type":"standard","title":"Python (programming language)","extract":"Python is a language."}"#)
                .unwrap();
        let summary = from_wire(wire, "python", 500).unwrap();
        assert_eq!(summary.title, "Python (programming language)");
    }
}
