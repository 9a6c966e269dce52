//! Built-in resolver backend with canned records.
//!
//! Used for offline runs and tests, the way the `dummy` LLM provider stands
//! in for a real model. Lookups are case-insensitive exact matches; anything
//! else fails with the same `NotFound` message the live source would give.

use super::book::{self, BookInfo};
use super::drug::{self, DrugInfo};
use super::stock::StockQuote;
use super::topic::{self, TopicSummary};
use super::{ResolveError, Scalar};

#[derive(Debug, Clone)]
pub struct FixtureResolvers {
    summary_limit: usize,
}

// (brand, generic, purpose, manufacturer)
const DRUGS: &[(&str, &str, &str, &str)] = &[
    ("Aspirin", "ASPIRIN", "Pain reliever/fever reducer", "Bayer HealthCare LLC."),
    ("Ibuprofen", "IBUPROFEN", "Pain reliever/fever reducer", "Perrigo"),
    ("Tylenol", "ACETAMINOPHEN", "Pain reliever/fever reducer", "Kenvue Brands LLC"),
];

// (symbol, open, high, low, price, previous close)
const QUOTES: &[(&str, &str, &str, &str, &str, &str)] = &[
    ("TSLA", "250.0000", "255.1000", "248.0000", "252.3000", "249.0000"),
    ("AAPL", "190.0000", "192.5000", "189.2000", "191.8000", "190.4000"),
    ("MSFT", "410.0000", "415.0000", "408.5000", "412.2000", "409.9000"),
];

// (title, author, first published, editions, key)
const BOOKS: &[(&str, &str, i64, i64, &str)] = &[
    ("Python", "Mark Lutz", 1996, 12, "/works/OL1966503W"),
    ("Dune", "Frank Herbert", 1965, 120, "/works/OL893415W"),
    ("The Rust Programming Language", "Steve Klabnik", 2018, 4, "/works/OL19545135W"),
];

const TOPICS: &[(&str, &str)] = &[
    (
        "Python",
        "Python is a high-level, general-purpose programming language. Its design philosophy emphasizes \
         code readability with the use of significant indentation.",
    ),
    (
        "Rust",
        "Rust is a general-purpose programming language emphasizing performance, type safety, and \
         concurrency. It enforces memory safety without a garbage collector.",
    ),
    (
        "Albert Einstein",
        "Albert Einstein was a German-born theoretical physicist who is best known for developing the \
         theory of relativity.",
    ),
];

impl FixtureResolvers {
    pub fn new(summary_limit: usize) -> Self {
        Self { summary_limit }
    }

    pub fn drug(&self, name: &str) -> Result<DrugInfo, ResolveError> {
        let (brand, generic, purpose, manufacturer) = DRUGS
            .iter()
            .find(|(brand, generic, ..)| brand.eq_ignore_ascii_case(name) || generic.eq_ignore_ascii_case(name))
            .ok_or_else(drug::not_found)?;
        Ok(DrugInfo {
            brand_name: brand.to_string(),
            generic_name: generic.to_string(),
            purpose: purpose.to_string(),
            active_ingredient: format!("{generic} 325 mg"),
            usage: "temporarily relieves minor aches and pains".to_string(),
            warnings: "Do not exceed the recommended dose.".to_string(),
            dosage: "Adults: 1 to 2 tablets every 4 to 6 hours".to_string(),
            manufacturer: manufacturer.to_string(),
        })
    }

    /// `symbol` is already a ticker. Symbols without a canned quote get a
    /// flat one so every known company resolves.
    pub fn stock(&self, symbol: &str) -> Result<StockQuote, ResolveError> {
        let quote = match QUOTES.iter().find(|(s, ..)| s.eq_ignore_ascii_case(symbol)) {
            Some((s, open, high, low, price, prev)) => StockQuote {
                symbol: s.to_string(),
                open: open.to_string(),
                high: high.to_string(),
                low: low.to_string(),
                price: price.to_string(),
                previous_close: prev.to_string(),
                change: change(price, prev),
                change_percent: change_percent(price, prev),
            },
            None => StockQuote {
                symbol: symbol.to_uppercase(),
                open: "100.0000".into(),
                high: "100.0000".into(),
                low: "100.0000".into(),
                price: "100.0000".into(),
                previous_close: "100.0000".into(),
                change: "0.0000".into(),
                change_percent: "0.0000%".into(),
            },
        };
        Ok(quote)
    }

    pub fn book(&self, title: &str) -> Result<BookInfo, ResolveError> {
        let (title, author, year, editions, key) = BOOKS
            .iter()
            .find(|(t, ..)| t.eq_ignore_ascii_case(title))
            .ok_or_else(book::not_found)?;
        Ok(BookInfo {
            title: title.to_string(),
            author: author.to_string(),
            first_published: Scalar::Number(*year),
            edition_count: Scalar::Number(*editions),
            openlibrary_id: key.to_string(),
        })
    }

    pub fn topic(&self, query: &str) -> Result<TopicSummary, ResolveError> {
        let (title, extract) = TOPICS
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(query))
            .ok_or_else(|| topic::not_found(query))?;
        Ok(TopicSummary {
            title: title.to_string(),
            summary: topic::truncate_chars(extract, self.summary_limit),
        })
    }
}

fn parse(v: &str) -> f64 {
    v.parse().unwrap_or(0.0)
}

fn change(price: &str, prev: &str) -> String {
    format!("{:.4}", parse(price) - parse(prev))
}

fn change_percent(price: &str, prev: &str) -> String {
    let prev = parse(prev);
    if prev == 0.0 {
        return "0.0000%".into();
    }
    format!("{:.4}%", (parse(price) - prev) / prev * 100.0)
}
