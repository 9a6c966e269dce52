//! Alpha Vantage global quote lookup.
//!
//! Free text is mapped to a ticker through [`STOCK_SYMBOLS`] before any
//! request is made.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ResolveError, decode, send};

const SOURCE: &str = "Alpha Vantage";

/// Company name → ticker symbol.
pub const STOCK_SYMBOLS: &[(&str, &str)] = &[
    ("Tesla", "TSLA"),
    ("Apple", "AAPL"),
    ("Microsoft", "MSFT"),
    ("Google", "GOOGL"),
    ("Amazon", "AMZN"),
    ("Nvidia", "NVDA"),
    ("Meta", "META"),
    ("Netflix", "NFLX"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockQuote {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Open Price")]
    pub open: String,
    #[serde(rename = "High Price")]
    pub high: String,
    #[serde(rename = "Low Price")]
    pub low: String,
    #[serde(rename = "Current Price")]
    pub price: String,
    #[serde(rename = "Previous Close")]
    pub previous_close: String,
    #[serde(rename = "Change")]
    pub change: String,
    #[serde(rename = "Change %")]
    pub change_percent: String,
}

/// First company whose name occurs (case-insensitively) in `query`.
///
/// Only company names are matched, not tickers, so a bare `"AAPL"` query
/// yields `None`.
pub fn symbol_for(query: &str) -> Option<&'static str> {
    let lower = query.to_lowercase();
    STOCK_SYMBOLS
        .iter()
        .find(|(company, _)| lower.contains(&company.to_lowercase()))
        .map(|(_, symbol)| *symbol)
}

pub(crate) fn unknown_symbol() -> ResolveError {
    ResolveError::InvalidQuery("Could not identify stock symbol. Please specify a valid company name.".into())
}

fn not_available(symbol: &str) -> ResolveError {
    ResolveError::NotFound(format!("Stock data not available for {symbol}."))
}

pub(crate) async fn fetch(
    client: &Client,
    base_url: &str,
    api_key: &str,
    symbol: &str,
) -> Result<StockQuote, ResolveError> {
    let req = client.get(format!("{base_url}/query")).query(&[
        ("function", "GLOBAL_QUOTE"),
        ("symbol", symbol),
        ("apikey", api_key),
    ]);

    let Some(response) = send(req, SOURCE).await? else {
        return Err(not_available(symbol));
    };
    let wire: QuoteResponse = decode(response, SOURCE).await?;
    from_wire(wire, symbol)
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuoteResponse {
    #[serde(rename = "Global Quote", default)]
    quote: Option<GlobalQuote>,
    /// Rate-limit and key notices arrive as 200 with one of these set.
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "02. open")]
    open: Option<String>,
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

impl GlobalQuote {
    fn is_empty(&self) -> bool {
        self.symbol.is_none() && self.price.is_none()
    }
}

fn or_na(v: Option<String>) -> String {
    v.unwrap_or_else(|| "N/A".to_string())
}

pub(crate) fn from_wire(wire: QuoteResponse, symbol: &str) -> Result<StockQuote, ResolveError> {
    if let Some(notice) = wire.note.or(wire.information) {
        return Err(ResolveError::Unavailable(format!("{SOURCE}: {notice}")));
    }
    let quote = wire.quote.filter(|q| !q.is_empty()).ok_or_else(|| not_available(symbol))?;
    Ok(StockQuote {
        symbol: or_na(quote.symbol),
        open: or_na(quote.open),
        high: or_na(quote.high),
        low: or_na(quote.low),
        price: or_na(quote.price),
        previous_close: or_na(quote.previous_close),
        change: or_na(quote.change),
        change_percent: or_na(quote.change_percent),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_from_company_name() {
        assert_eq!(symbol_for("Tesla"), Some("TSLA"));
        assert_eq!(symbol_for("how is microsoft doing"), Some("MSFT"));
        assert_eq!(symbol_for("NETFLIX"), Some("NFLX"));
    }

    #[test]
    fn tickers_and_unknowns_not_matched() {
        assert_eq!(symbol_for("AAPL"), None);
        assert_eq!(symbol_for("Acme"), None);
        assert_eq!(symbol_for(""), None);
    }

    #[test]
    fn first_table_entry_wins() {
        assert_eq!(symbol_for("apple vs tesla"), Some("TSLA"));
    }

    #[test]
    fn quote_mapped() {
        let wire: QuoteResponse = serde_json::from_str(
            r#"{"Global Quote":{"01. symbol":"TSLA","02. open":"250.00","03. high":"255.10","04. low":"248.00",
                "05. price":"252.30","06. volume":"1000","07. latest trading day":"2024-01-02",
                "08. previous close":"249.00","09. change":"3.30","10. change percent":"1.3253%"}}"#,
        )
        .unwrap();
        let quote = from_wire(wire, "TSLA").unwrap();
        assert_eq!(quote.price, "252.30");
        assert_eq!(quote.change_percent, "1.3253%");
    }

    #[test]
    fn empty_quote_is_not_found() {
        let wire: QuoteResponse = serde_json::from_str(r#"{"Global Quote":{}}"#).unwrap();
        let err = from_wire(wire, "META").unwrap_err();
        assert_eq!(err, ResolveError::NotFound("Stock data not available for META.".into()));
    }

    #[test]
    fn rate_limit_note_is_unavailable() {
        let wire: QuoteResponse =
            serde_json::from_str(r#"{"Note":"Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#)
                .unwrap();
        assert!(matches!(from_wire(wire, "TSLA"), Err(ResolveError::Unavailable(_))));
    }

    #[test]
    fn partial_quote_fills_na() {
        let wire: QuoteResponse =
            serde_json::from_str(r#"{"Global Quote":{"01. symbol":"AMZN","05. price":"180.00"}}"#).unwrap();
        let quote = from_wire(wire, "AMZN").unwrap();
        assert_eq!(quote.open, "N/A");
        assert_eq!(quote.price, "180.00");
    }
}
