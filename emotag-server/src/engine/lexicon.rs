//! Lexicon-backed emotion engine
//!
//! The artifact is a JSON document mapping emotion labels to weighted
//! terms. Loading and indexing the full lexicon is the expensive one-time
//! build step; classification itself is a per-token table lookup.

use super::{EmotionEngine, EngineError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// On-disk shape of the lexicon artifact
#[derive(Debug, Deserialize)]
struct LexiconFile {
    /// Label emitted when no term matches
    fallback: String,
    /// Emotion label -> terms that vote for it
    labels: HashMap<String, Vec<String>>,
}

/// Emotion engine backed by a term lexicon
pub struct LexiconEngine {
    /// Term -> label index, built once at load
    terms: HashMap<String, String>,
    fallback: String,
}

impl LexiconEngine {
    /// Build the engine from a fetched lexicon artifact.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Build the engine from lexicon JSON (tests use this directly).
    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let file: LexiconFile =
            serde_json::from_str(raw).map_err(|e| EngineError::Parse(e.to_string()))?;

        let mut terms = HashMap::new();
        for (label, label_terms) in &file.labels {
            for term in label_terms {
                terms.insert(term.to_lowercase(), label.clone());
            }
        }

        if terms.is_empty() {
            return Err(EngineError::EmptyLexicon);
        }

        info!(
            "Lexicon loaded: {} terms across {} labels",
            terms.len(),
            file.labels.len()
        );

        Ok(Self { terms, fallback: file.fallback })
    }

    /// Tag one normalized sentence: each matching token votes for its
    /// label, the label with the most votes wins, ties break
    /// alphabetically so results are deterministic.
    fn tag(&self, sentence: &str) -> String {
        let mut votes: HashMap<&str, usize> = HashMap::new();
        for token in sentence.split_whitespace() {
            if let Some(label) = self.terms.get(token) {
                *votes.entry(label.as_str()).or_insert(0) += 1;
            }
        }

        votes
            .into_iter()
            .max_by(|(label_a, count_a), (label_b, count_b)| {
                count_a.cmp(count_b).then(label_b.cmp(label_a))
            })
            .map(|(label, _)| label.to_string())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl EmotionEngine for LexiconEngine {
    fn infer(&self, sentences: &[String]) -> Result<Vec<String>, EngineError> {
        Ok(sentences.iter().map(|s| self.tag(s)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEXICON: &str = r#"{
        "fallback": "neutral",
        "labels": {
            "joy": ["enjoy", "sunny", "happy"],
            "sadness": ["miss", "lonely"],
            "anger": ["furious"]
        }
    }"#;

    #[test]
    fn loads_and_tags_by_majority_vote() {
        let engine = LexiconEngine::from_json(LEXICON).unwrap();
        assert_eq!(engine.tag("i enjoy sunny days"), "joy");
        assert_eq!(engine.tag("i miss you"), "sadness");
    }

    #[test]
    fn unmatched_sentence_gets_fallback() {
        let engine = LexiconEngine::from_json(LEXICON).unwrap();
        assert_eq!(engine.tag("the meeting is at noon"), "neutral");
    }

    #[test]
    fn tie_breaks_alphabetically() {
        let engine = LexiconEngine::from_json(LEXICON).unwrap();
        // one vote each for anger and sadness
        assert_eq!(engine.tag("furious and lonely"), "anger");
    }

    #[test]
    fn infer_is_aligned_with_input() {
        let engine = LexiconEngine::from_json(LEXICON).unwrap();
        let input = vec![
            "i enjoy sunny days".to_string(),
            "nothing matches here".to_string(),
            "i miss you".to_string(),
        ];
        let output = engine.infer(&input).unwrap();
        assert_eq!(output, vec!["joy", "neutral", "sadness"]);
    }

    #[test]
    fn rejects_garbage_and_empty_lexicons() {
        assert!(matches!(
            LexiconEngine::from_json("not json"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            LexiconEngine::from_json(r#"{"fallback": "neutral", "labels": {}}"#),
            Err(EngineError::EmptyLexicon)
        ));
    }
}
