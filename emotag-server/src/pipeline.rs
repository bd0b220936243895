//! Batch dedup-cache tagging pipeline
//!
//! Per request: dedup raw sentences, normalize, chunk, and for each chunk
//! resolve every sentence from the cache or the engine — never both, never
//! twice. The engine only ever sees normalized sentences that neither the
//! cache nor an earlier chunk of the same request could resolve.

use crate::engine::{EmotionEngine, EngineError};
use emotag_common::db::SentenceCache;
use emotag_common::normalise_sentence;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

/// Pipeline errors. Cache trouble is deliberately absent: the cache is
/// best-effort and can only cost extra inference, never a failed request.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Engine broke the alignment contract (one label per input, in order)
    #[error("Engine returned {got} labels for {expected} sentences")]
    Misaligned { expected: usize, got: usize },

    #[error("Batch size must be a positive integer")]
    InvalidBatchSize,
}

/// How a single chunk index got its label. Cache hits and inferred labels
/// partition each chunk; keeping the tag explicit means an overlap bug
/// shows up as a wrong variant instead of being masked by map merging.
enum Resolution {
    CacheHit(String),
    Inferred(String),
}

/// Batch sentence tagging with shared-cache dedup
pub struct TagPipeline<'a> {
    cache: &'a SentenceCache,
    engine: &'a dyn EmotionEngine,
    batch_size: usize,
}

impl<'a> TagPipeline<'a> {
    pub fn new(cache: &'a SentenceCache, engine: &'a dyn EmotionEngine, batch_size: usize) -> Self {
        Self { cache, engine, batch_size }
    }

    /// Tag every distinct sentence in the request.
    ///
    /// Returns a mapping keyed by raw sentence. Repeated raw sentences cost
    /// one resolution and appear once in the mapping.
    pub async fn run(
        &self,
        raw_sentences: &[String],
    ) -> Result<HashMap<String, String>, PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidBatchSize);
        }

        // Set semantics on raw sentences, preserving first-seen order so
        // chunking stays deterministic
        let mut seen = HashSet::new();
        let distinct: Vec<&String> = raw_sentences
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .collect();

        let mut tagged = HashMap::new();
        if distinct.is_empty() {
            return Ok(tagged);
        }

        info!("Tagging {} distinct sentences", distinct.len());

        let normalised: Vec<String> = distinct.iter().map(|s| normalise_sentence(s)).collect();

        // Labels already resolved earlier in this request, keyed by
        // normalized sentence. Distinct raw sentences can normalize to the
        // same key; this map keeps such repeats away from the engine even
        // when the cache is unavailable.
        let mut resolved: HashMap<String, String> = HashMap::new();

        // Chunk the parallel raw/normalized lists to bound per-call
        // inference cost; the final chunk may be smaller
        for (raw_chunk, norm_chunk) in distinct
            .chunks(self.batch_size)
            .zip(normalised.chunks(self.batch_size))
        {
            self.resolve_chunk(raw_chunk, norm_chunk, &mut resolved, &mut tagged)
                .await?;
        }

        Ok(tagged)
    }

    /// Resolve one chunk: cache lookup, inference for the misses, cache
    /// population, merge into the result mapping.
    async fn resolve_chunk(
        &self,
        raw_chunk: &[&String],
        norm_chunk: &[String],
        resolved: &mut HashMap<String, String>,
        tagged: &mut HashMap<String, String>,
    ) -> Result<(), PipelineError> {
        // Only keys this request has not already resolved go to the store
        let lookup_keys: Vec<String> = norm_chunk
            .iter()
            .filter(|k| !resolved.contains_key(*k))
            .cloned()
            .collect();
        let cached = self.cache.lookup_many(&lookup_keys).await;
        if cached.degraded {
            debug!("Cache degraded for this chunk, resolving everything via inference");
        }
        resolved.extend(cached.value);

        // Partition chunk indices into hits and misses. Zero cache matches
        // simply means every index is a miss.
        let mut miss_keys: Vec<String> = Vec::new();
        for key in norm_chunk {
            if !resolved.contains_key(key) && !miss_keys.contains(key) {
                miss_keys.push(key.clone());
            }
        }

        if !miss_keys.is_empty() {
            let labels = self.engine.infer(&miss_keys)?;
            if labels.len() != miss_keys.len() {
                return Err(PipelineError::Misaligned {
                    expected: miss_keys.len(),
                    got: labels.len(),
                });
            }

            let new_pairs: Vec<(String, String)> = miss_keys
                .iter()
                .cloned()
                .zip(labels)
                .collect();

            // Best-effort: a failed insert costs a future recompute, not
            // this request
            self.cache.insert_many(&new_pairs).await;
            resolved.extend(new_pairs);
        }

        // Merge into the result mapping keyed by the original raw
        // sentences. Every index carries exactly one resolution.
        let mut hits = 0usize;
        let mut inferred = 0usize;
        for (index, raw) in raw_chunk.iter().enumerate() {
            let key = &norm_chunk[index];
            let resolution = match resolved.get(key) {
                Some(label) if miss_keys.contains(key) => Resolution::Inferred(label.clone()),
                Some(label) => Resolution::CacheHit(label.clone()),
                // Every key is either a prior hit or was just inferred
                None => {
                    return Err(PipelineError::Misaligned {
                        expected: norm_chunk.len(),
                        got: resolved.len(),
                    })
                }
            };
            let label = match resolution {
                Resolution::CacheHit(label) => {
                    hits += 1;
                    label
                }
                Resolution::Inferred(label) => {
                    inferred += 1;
                    label
                }
            };
            tagged.insert((*raw).clone(), label);
        }
        debug!("Chunk resolved: {} cache hits, {} inferred", hits, inferred);

        Ok(())
    }
}
