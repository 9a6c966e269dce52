//! Open Library title search.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ResolveError, Scalar, decode, send};

const SOURCE: &str = "Open Library";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInfo {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "First Published")]
    pub first_published: Scalar,
    #[serde(rename = "Edition Count")]
    pub edition_count: Scalar,
    #[serde(rename = "OpenLibrary ID")]
    pub openlibrary_id: String,
}

pub(crate) fn not_found() -> ResolveError {
    ResolveError::NotFound("Book not found.".into())
}

pub(crate) async fn fetch(client: &Client, base_url: &str, title: &str) -> Result<BookInfo, ResolveError> {
    let req = client
        .get(format!("{base_url}/search.json"))
        .query(&[("title", title), ("limit", "1")]);

    let Some(response) = send(req, SOURCE).await? else {
        return Err(not_found());
    };
    let wire: SearchResponse = decode(response, SOURCE).await?;
    from_wire(wire).ok_or_else(not_found)
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Debug, Default, Deserialize)]
struct Doc {
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    first_publish_year: Option<i64>,
    edition_count: Option<i64>,
    key: Option<String>,
}

pub(crate) fn from_wire(wire: SearchResponse) -> Option<BookInfo> {
    let doc = wire.docs.into_iter().next()?;
    Some(BookInfo {
        title: doc.title.unwrap_or_else(|| "Unknown".into()),
        author: doc.author_name.into_iter().next().unwrap_or_else(|| "Unknown".into()),
        first_published: doc.first_publish_year.map_or_else(|| Scalar::from("Unknown"), Scalar::Number),
        edition_count: doc.edition_count.map_or_else(|| Scalar::from("N/A"), Scalar::Number),
        openlibrary_id: doc.key.unwrap_or_else(|| "N/A".into()),
    })
}
