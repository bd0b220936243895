//! Lexicon artifact retrieval
//!
//! Downloads the emotion lexicon from remote storage into the root folder.
//! The fetch runs under the cross-process init lock, so there is never a
//! concurrent writer; a stale local copy is deleted first because its
//! integrity cannot be guaranteed (the previous holder may have died
//! mid-download).

use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

const USER_AGENT: &str = concat!("emotag/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Artifact fetch errors. Fatal for the initialization attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Artifact server returned status {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download the lexicon artifact to `dest`, replacing any local copy.
pub async fn fetch_lexicon(url: &str, dest: &Path) -> Result<(), FetchError> {
    if dest.exists() {
        std::fs::remove_file(dest)?;
    }

    info!("Downloading lexicon artifact from {}", url);

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().as_u16()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    // Write-then-rename so a crash mid-write never leaves a half artifact
    // under the final name
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &bytes)?;
    std::fs::rename(&partial, dest)?;

    info!("Lexicon artifact downloaded to {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn stale_artifact_is_deleted_even_when_fetch_fails() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("emotion-lexicon.json");
        std::fs::write(&dest, "{\"stale\": true}").unwrap();

        let result = fetch_lexicon("http://127.0.0.1:1/unreachable", &dest).await;

        assert!(matches!(result, Err(FetchError::Network(_))));
        assert!(!dest.exists(), "Stale artifact should have been removed");
    }
}
