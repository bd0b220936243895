//! Emotion inference engine
//!
//! The pipeline depends only on the [`EmotionEngine`] trait; the shipped
//! implementation is [`LexiconEngine`], built from the downloaded lexicon
//! artifact. Tests substitute recording or failing engines through the
//! same trait.

use thiserror::Error;

mod lexicon;
pub use lexicon::LexiconEngine;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Lexicon artifact could not be parsed
    #[error("Lexicon parse error: {0}")]
    Parse(String),

    /// Lexicon artifact defines no terms
    #[error("Lexicon defines no terms")]
    EmptyLexicon,

    /// I/O error reading the artifact
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inference-time failure
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Batch emotion inference port.
///
/// Contract: output is one label per input sentence, aligned by position,
/// same length out as in. Inputs are already-normalized sentences.
pub trait EmotionEngine: Send + Sync {
    fn infer(&self, sentences: &[String]) -> Result<Vec<String>, EngineError>;
}
