//! Lazy engine initialization
//!
//! The lexicon engine is expensive to build (artifact download plus lexicon
//! indexing), so it is built at most once per process and shared by every
//! request that process handles. Across processes, the database-backed
//! [`InitLock`] serializes the download so concurrent cold starts cannot
//! corrupt each other's artifact; within a process, the `OnceCell` gives
//! at-most-once-writer semantics even when the runtime interleaves
//! requests.

use crate::artifact::{self, FetchError};
use crate::engine::{EmotionEngine, EngineError, LexiconEngine};
use emotag_common::db::InitLock;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Engine initialization errors. Fatal for this process's attempt; the
/// init lock is always released before one of these propagates.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Common(#[from] emotag_common::Error),

    #[error("Engine initializer has no artifact source configured")]
    NoSource,
}

/// Where a cold process gets its engine from
struct InitSource {
    lock: InitLock,
    lexicon_url: String,
    lexicon_path: PathBuf,
}

/// Process-scoped holder for the lazily built emotion engine
#[derive(Clone)]
pub struct EngineInitializer {
    inner: Arc<Inner>,
}

struct Inner {
    engine: OnceCell<Arc<dyn EmotionEngine>>,
    source: Option<InitSource>,
}

impl EngineInitializer {
    pub fn new(lock: InitLock, lexicon_url: String, lexicon_path: PathBuf) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine: OnceCell::new(),
                source: Some(InitSource { lock, lexicon_url, lexicon_path }),
            }),
        }
    }

    /// Wrap an already built engine; the lock and artifact fetch are never
    /// touched. Used by tests.
    pub fn preloaded(engine: Arc<dyn EmotionEngine>) -> Self {
        let cell = OnceCell::new();
        cell.set(engine).ok();
        Self {
            inner: Arc::new(Inner { engine: cell, source: None }),
        }
    }

    /// Get the shared engine, building it on first use.
    ///
    /// The warm path touches neither the network nor the lock. A failed
    /// build leaves the cell empty, so a later request retries.
    pub async fn get_or_init(&self) -> Result<Arc<dyn EmotionEngine>, InitError> {
        if let Some(engine) = self.inner.engine.get() {
            return Ok(engine.clone());
        }

        let source = self.inner.source.as_ref().ok_or(InitError::NoSource)?;
        let engine = self
            .inner
            .engine
            .get_or_try_init(|| Self::build(source))
            .await?;
        Ok(engine.clone())
    }

    async fn build(source: &InitSource) -> Result<Arc<dyn EmotionEngine>, InitError> {
        info!("Engine not loaded, initiating download");

        source.lock.acquire().await?;

        let built = Self::fetch_and_load(source).await;

        // The lock is released on success and failure alike; a build error
        // must never leave it held
        if let Err(release_err) = source.lock.release().await {
            if built.is_ok() {
                return Err(release_err.into());
            }
            error!(
                "Failed to release init lock after failed initialization: {}",
                release_err
            );
        }

        let engine = built?;
        info!("Engine loaded and shared for the process lifetime");
        Ok(engine)
    }

    async fn fetch_and_load(source: &InitSource) -> Result<Arc<dyn EmotionEngine>, InitError> {
        artifact::fetch_lexicon(&source.lexicon_url, &source.lexicon_path).await?;
        let engine = LexiconEngine::load(&source.lexicon_path)?;
        Ok(Arc::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emotag_common::db::init_database;
    use std::time::Duration;
    use tempfile::TempDir;

    struct FixedEngine;

    impl EmotionEngine for FixedEngine {
        fn infer(&self, sentences: &[String]) -> Result<Vec<String>, EngineError> {
            Ok(vec!["neutral".to_string(); sentences.len()])
        }
    }

    #[tokio::test]
    async fn preloaded_engine_skips_lock_and_network() {
        let initializer = EngineInitializer::preloaded(Arc::new(FixedEngine));
        let engine = initializer.get_or_init().await.unwrap();
        let labels = engine.infer(&["anything".to_string()]).unwrap();
        assert_eq!(labels, vec!["neutral"]);
    }

    #[tokio::test]
    async fn failed_build_releases_the_lock_and_allows_retry() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("emotag.db")).await.unwrap();
        let lock = InitLock::with_timing(
            pool.clone(),
            Duration::from_millis(50),
            Duration::from_secs(60),
        );

        let initializer = EngineInitializer::new(
            lock,
            "http://127.0.0.1:1/unreachable".to_string(),
            dir.path().join("emotion-lexicon.json"),
        );

        let result = initializer.get_or_init().await;
        assert!(matches!(result, Err(InitError::Fetch(_))));

        // The failed attempt must not leave the lock held
        let probe = InitLock::new(pool);
        assert!(probe.try_acquire().await.unwrap());
    }
}
