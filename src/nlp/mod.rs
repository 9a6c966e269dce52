//! Entity/intent classifier.
//!
//! [`Classifier::classify`] maps raw text to an [`Intent`] and an
//! [`EntityMap`]. Intent detection is a pure keyword match; entity
//! extraction goes through the configured [`EntityRecognizer`].

pub mod entities;
pub mod intent;

pub use entities::{EntityMap, EntityRecognizer, GazetteerRecognizer, RemoteRecognizer};
pub use intent::{Intent, detect_intent};

use thiserror::Error;

use crate::config::NlpConfig;

#[derive(Debug, Error)]
#[error("entity extraction failed: {0}")]
pub struct NlpError(pub String);

/// Output of one classification.
#[derive(Debug, Clone)]
pub struct Classification {
    pub intent: Intent,
    pub entities: EntityMap,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    recognizer: EntityRecognizer,
}

impl Classifier {
    pub fn new(recognizer: EntityRecognizer) -> Self {
        Self { recognizer }
    }

    /// Build from `[nlp]` config. Unknown recognizer names fail at startup.
    pub fn from_config(config: &NlpConfig) -> Result<Self, NlpError> {
        let recognizer = match config.recognizer.as_str() {
            "gazetteer" => EntityRecognizer::Gazetteer(GazetteerRecognizer),
            "remote" => {
                let endpoint = config
                    .endpoint
                    .clone()
                    .ok_or_else(|| NlpError("remote recognizer needs an endpoint".into()))?;
                EntityRecognizer::Remote(RemoteRecognizer::new(endpoint, config.timeout_seconds)?)
            }
            other => return Err(NlpError(format!("unknown recognizer: {other}"))),
        };
        Ok(Self::new(recognizer))
    }

    pub fn intent(&self, text: &str) -> Intent {
        detect_intent(text)
    }

    pub async fn entities(&self, text: &str) -> Result<EntityMap, NlpError> {
        self.recognizer.extract(text).await
    }

    /// Intent plus entities. A recognizer failure fails the whole call;
    /// there is no partial result.
    pub async fn classify(&self, text: &str) -> Result<Classification, NlpError> {
        let intent = self.intent(text);
        let entities = self.entities(text).await?;
        Ok(Classification { intent, entities })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn classify_with_gazetteer() {
        let c = Classifier::new(EntityRecognizer::Gazetteer(GazetteerRecognizer));
        let out = c.classify("Tell me about Marie Curie").await.unwrap();
        assert_eq!(out.intent, Intent::Information);
        assert_eq!(out.entities.first_value(), Some("Marie Curie"));
    }

    #[tokio::test]
    async fn recognizer_failure_fails_classify() {
        let c = Classifier::new(EntityRecognizer::Remote(
            RemoteRecognizer::new("http://127.0.0.1:1/ents".into(), 2).unwrap(),
        ));
        assert!(c.classify("hello").await.is_err());
    }

    #[test]
    fn unknown_recognizer_rejected() {
        let mut cfg = Config::offline().nlp;
        cfg.recognizer = "spacy".into();
        assert!(Classifier::from_config(&cfg).is_err());
    }
}
