//! Shared sentence result cache
//!
//! Cache reads and writes are best-effort: a broken store costs
//! performance (everything re-infers), never correctness. Store errors are
//! logged and reported through [`BestEffort::degraded`] instead of
//! propagating, so the pipeline keeps running against an unavailable
//! database.

use crate::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Outcome of a best-effort cache operation.
///
/// `degraded` is set when the backing store failed and the value is the
/// empty fallback. Callers may inspect it (e.g. for logging) but must not
/// treat it as an error.
#[derive(Debug, Clone)]
pub struct BestEffort<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> BestEffort<T> {
    fn applied(value: T) -> Self {
        Self { value, degraded: false }
    }

    fn degraded(value: T) -> Self {
        Self { value, degraded: true }
    }
}

/// Batched access to the processed_sentences table
#[derive(Clone)]
pub struct SentenceCache {
    pool: SqlitePool,
}

impl SentenceCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up previously processed sentences by normalized key.
    ///
    /// Returns only the keys that were found; zero matches is an empty map,
    /// not an error. A store failure degrades to "nothing found".
    pub async fn lookup_many(&self, normalised: &[String]) -> BestEffort<HashMap<String, String>> {
        if normalised.is_empty() {
            return BestEffort::applied(HashMap::new());
        }

        match self.lookup_many_inner(normalised).await {
            Ok(matched) => {
                if !matched.is_empty() {
                    info!("Cache matched {} of {} sentences", matched.len(), normalised.len());
                }
                BestEffort::applied(matched)
            }
            Err(e) => {
                warn!("Cache lookup failed, treating all sentences as unprocessed: {}", e);
                BestEffort::degraded(HashMap::new())
            }
        }
    }

    async fn lookup_many_inner(&self, normalised: &[String]) -> Result<HashMap<String, String>> {
        // Dynamic placeholder list for the IN clause; sqlite has no array
        // bind type
        let placeholders = vec!["?"; normalised.len()].join(", ");
        let sql = format!(
            "SELECT normalised_sentence, processed_sentence \
             FROM processed_sentences WHERE normalised_sentence IN ({})",
            placeholders
        );

        let mut query = sqlx::query_as::<_, (String, String)>(&sql);
        for key in normalised {
            query = query.bind(key);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    /// Insert newly processed sentence pairs.
    ///
    /// Existing keys are never overwritten: `INSERT OR IGNORE` lets a
    /// concurrent writer that lost the race fail harmlessly against the
    /// primary key. The returned count is the number of rows actually
    /// inserted.
    pub async fn insert_many(&self, pairs: &[(String, String)]) -> BestEffort<u64> {
        if pairs.is_empty() {
            return BestEffort::applied(0);
        }

        match self.insert_many_inner(pairs).await {
            Ok(inserted) => {
                if inserted < pairs.len() as u64 {
                    debug!(
                        "Skipped {} already-cached sentences during insert",
                        pairs.len() as u64 - inserted
                    );
                }
                info!("Inserted {} processed sentences", inserted);
                BestEffort::applied(inserted)
            }
            Err(e) => {
                warn!("Cache insert failed, results not persisted: {}", e);
                BestEffort::degraded(0)
            }
        }
    }

    async fn insert_many_inner(&self, pairs: &[(String, String)]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for (normalised, processed) in pairs {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO processed_sentences \
                 (normalised_sentence, processed_sentence) VALUES (?, ?)",
            )
            .bind(normalised)
            .bind(processed)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
