//! Generative provider implementations.
//!
//! `build(config, api_key)` is the factory, called at startup.
//! Adding a new backend = new module + new match arm.

pub mod cohere;
pub mod dummy;
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct an `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from `LLM_API_KEY` (never TOML) and is `None` for
/// keyless local models.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "cohere" => {
            let c = &config.cohere;
            let p = cohere::CohereProvider::new(
                c.api_base_url.clone(),
                c.model.clone(),
                c.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::Cohere(p))
        }
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.temperature,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn builds_each_known_provider() {
        let mut cfg = Config::offline().llm;
        for (name, expected) in [("dummy", "dummy"), ("cohere", "cohere"), ("openai", "openai")] {
            cfg.provider = name.to_string();
            assert_eq!(build(&cfg, None).unwrap().name(), expected);
        }
    }

    #[test]
    fn unknown_provider_errors() {
        let mut cfg = Config::offline().llm;
        cfg.provider = "palm".into();
        assert!(matches!(build(&cfg, None), Err(ProviderError::UnknownProvider(p)) if p == "palm"));
    }
}
