//! Cross-process initialization lock
//!
//! A mutex built on a single well-known database row. Worker processes that
//! may or may not share a host use it to serialize one-time engine
//! initialization (artifact download + model build), which takes minutes.
//!
//! Acquisition is a blocking poll with no upper retry bound. That is
//! acceptable here and only here: the critical section is rare and long,
//! so a 10 second poll interval loses nothing proportionally. This is not
//! a general-purpose lock primitive.
//!
//! Each acquisition takes a lease. A holder that crashes without releasing
//! keeps the lock only until its lease expires, after which the next
//! acquirer reclaims it.

use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, info};

/// Well-known row id of the singleton lock record.
const LOCK_ROW_ID: i64 = 1;

/// Default wait between failed acquire attempts.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default lease duration. Generous: engine initialization is expected to
/// take minutes, and an expired lease hands the lock to another process.
const DEFAULT_LEASE: Duration = Duration::from_secs(300);

/// Cross-process mutex on a shared database row
#[derive(Clone)]
pub struct InitLock {
    pool: SqlitePool,
    poll_interval: Duration,
    lease: Duration,
}

impl InitLock {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            poll_interval: DEFAULT_POLL_INTERVAL,
            lease: DEFAULT_LEASE,
        }
    }

    /// Override poll interval and lease duration (tests use short values).
    pub fn with_timing(pool: SqlitePool, poll_interval: Duration, lease: Duration) -> Self {
        Self { pool, poll_interval, lease }
    }

    /// Acquire the lock, blocking (polling) until it is held.
    ///
    /// The caller must pair this with [`release`](Self::release) on every
    /// exit path; there is no ownership token and no reentrancy, so a
    /// second acquire without a release blocks until the lease expires.
    pub async fn acquire(&self) -> Result<()> {
        loop {
            if self.try_acquire().await? {
                info!("Acquired init lock");
                return Ok(());
            }
            debug!(
                "Init lock held elsewhere, retrying in {}s",
                self.poll_interval.as_secs()
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One conditional acquire attempt. Returns whether this call caused
    /// the unlocked (or absent, or lease-expired) to locked transition.
    pub async fn try_acquire(&self) -> Result<bool> {
        // Make sure the singleton row exists; the conditional update below
        // then covers the created-unlocked case atomically
        sqlx::query("INSERT OR IGNORE INTO init_locks (id, locked) VALUES (?, 0)")
            .bind(LOCK_ROW_ID)
            .execute(&self.pool)
            .await?;

        let now = Utc::now().timestamp();
        let expires = now + self.lease.as_secs() as i64;

        let result = sqlx::query(
            "UPDATE init_locks SET locked = 1, lease_expires_at = ? \
             WHERE id = ? AND (locked = 0 OR lease_expires_at <= ?)",
        )
        .bind(expires)
        .bind(LOCK_ROW_ID)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Release the lock.
    ///
    /// Releasing while not locked is a logic bug (double-release) and
    /// returns [`Error::LockProtocol`] rather than being swallowed.
    pub async fn release(&self) -> Result<()> {
        let result = sqlx::query(
            "UPDATE init_locks SET locked = 0, lease_expires_at = NULL \
             WHERE id = ? AND locked = 1",
        )
        .bind(LOCK_ROW_ID)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::LockProtocol(
                "trying to unlock init lock, but already unlocked".to_string(),
            ));
        }

        info!("Released init lock");
        Ok(())
    }
}
