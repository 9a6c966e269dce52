//! OpenFDA drug-label lookup by brand name.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ResolveError, decode, send};

const SOURCE: &str = "OpenFDA";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugInfo {
    #[serde(rename = "Brand Name")]
    pub brand_name: String,
    #[serde(rename = "Generic Name")]
    pub generic_name: String,
    #[serde(rename = "Purpose")]
    pub purpose: String,
    #[serde(rename = "Active Ingredient")]
    pub active_ingredient: String,
    #[serde(rename = "Usage")]
    pub usage: String,
    #[serde(rename = "Warnings")]
    pub warnings: String,
    #[serde(rename = "Dosage")]
    pub dosage: String,
    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,
}

pub(crate) fn not_found() -> ResolveError {
    ResolveError::NotFound("Drug information not found.".into())
}

pub(crate) async fn fetch(client: &Client, base_url: &str, name: &str) -> Result<DrugInfo, ResolveError> {
    let req = client
        .get(format!("{base_url}/drug/label.json"))
        .query(&[("search", search_term(name)), ("limit", "1".to_string())]);

    // OpenFDA answers 404 when the search has no hits.
    let Some(response) = send(req, SOURCE).await? else {
        return Err(not_found());
    };
    let wire: LabelResponse = decode(response, SOURCE).await?;
    from_wire(wire).ok_or_else(not_found)
}

/// Multi-word names must be quoted in OpenFDA query syntax.
fn search_term(name: &str) -> String {
    if name.contains(char::is_whitespace) {
        format!("openfda.brand_name:\"{name}\"")
    } else {
        format!("openfda.brand_name:{name}")
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LabelResponse {
    #[serde(default)]
    results: Vec<Label>,
}

#[derive(Debug, Default, Deserialize)]
struct Label {
    #[serde(default)]
    openfda: OpenFdaFields,
    #[serde(default)]
    purpose: Vec<String>,
    #[serde(default)]
    active_ingredient: Vec<String>,
    #[serde(default)]
    indications_and_usage: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    dosage_and_administration: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenFdaFields {
    #[serde(default)]
    brand_name: Vec<String>,
    #[serde(default)]
    generic_name: Vec<String>,
    #[serde(default)]
    manufacturer_name: Vec<String>,
}

fn first_or(values: Vec<String>, fallback: &str) -> String {
    values.into_iter().next().unwrap_or_else(|| fallback.to_string())
}

pub(crate) fn from_wire(wire: LabelResponse) -> Option<DrugInfo> {
    let label = wire.results.into_iter().next()?;
    Some(DrugInfo {
        brand_name: first_or(label.openfda.brand_name, "Unknown"),
        generic_name: first_or(label.openfda.generic_name, "Unknown"),
        purpose: first_or(label.purpose, "Not available"),
        active_ingredient: first_or(label.active_ingredient, "Not available"),
        usage: first_or(label.indications_and_usage, "Not available"),
        warnings: first_or(label.warnings, "No warnings available"),
        dosage: first_or(label.dosage_and_administration, "Not available"),
        manufacturer: first_or(label.openfda.manufacturer_name, "Unknown"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_label_mapped() {
        let wire: LabelResponse = serde_json::from_str(
            r#"{"results":[{
                "openfda":{"brand_name":["Bayer Aspirin"],"generic_name":["ASPIRIN"],"manufacturer_name":["Bayer"]},
                "purpose":["Pain reliever"],
                "active_ingredient":["Aspirin 325 mg"],
                "indications_and_usage":["temporarily relieves minor aches"],
                "warnings":["Reye's syndrome"],
                "dosage_and_administration":["1 to 2 tablets"]
            }]}"#,
        )
        .unwrap();
        let info = from_wire(wire).unwrap();
        assert_eq!(info.brand_name, "Bayer Aspirin");
        assert_eq!(info.manufacturer, "Bayer");
        assert_eq!(info.dosage, "1 to 2 tablets");
    }

    #[test]
    fn missing_fields_get_placeholders() {
        let wire: LabelResponse = serde_json::from_str(r#"{"results":[{"openfda":{}}]}"#).unwrap();
        let info = from_wire(wire).unwrap();
        assert_eq!(info.brand_name, "Unknown");
        assert_eq!(info.purpose, "Not available");
        assert_eq!(info.warnings, "No warnings available");
    }

    #[test]
    fn empty_results_is_none() {
        let wire: LabelResponse = serde_json::from_str(r#"{"results":[]}"#).unwrap();
        assert!(from_wire(wire).is_none());
    }

    #[test]
    fn serialized_keys_are_labels() {
        let wire: LabelResponse = serde_json::from_str(r#"{"results":[{}]}"#).unwrap();
        let json = serde_json::to_value(from_wire(wire).unwrap()).unwrap();
        assert_eq!(json["Active Ingredient"], "Not available");
        assert_eq!(json["Generic Name"], "Unknown");
    }

    #[test]
    fn multi_word_names_quoted() {
        assert_eq!(search_term("aspirin"), "openfda.brand_name:aspirin");
        assert_eq!(search_term("Bayer Aspirin"), "openfda.brand_name:\"Bayer Aspirin\"");
    }
}
