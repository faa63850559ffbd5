//! Credential storage for the access/refresh token pair
//!
//! Manages a single token pair, optionally persisted to a JSON file. All
//! writes use atomic temp-file + rename to prevent corruption on crash. A
//! tokio Mutex serializes concurrent access from request augmentation and
//! the refresh coordinator.
//!
//! The pair is only ever replaced whole or cleared — a partially refreshed
//! credential is never visible to readers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::exchange::TokenResponse;

/// The access/refresh token pair for one session.
///
/// `expires_at` is a unix timestamp in milliseconds (absolute, not a
/// delta). Computed at storage time from `TokenResponse.expires_in`
/// (seconds delta) plus the current time; absent when the exchange did not
/// report a lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Current access token (Bearer token for API calls)
    pub access: String,
    /// Refresh token for obtaining new access tokens
    pub refresh: String,
    /// Expiration as unix timestamp in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl TokenPair {
    /// Build a pair from a refresh-exchange response, converting the
    /// `expires_in` delta to an absolute timestamp.
    pub fn from_response(response: TokenResponse) -> Self {
        // Saturating: an absurd expires_in from the endpoint must not
        // wrap into a timestamp in the past
        let expires_at = response
            .expires_in
            .map(|secs| now_millis().saturating_add(secs.saturating_mul(1000)));
        Self {
            access: response.access_token,
            refresh: response.refresh_token,
            expires_at,
        }
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Thread-safe holder for the session's token pair.
///
/// The Mutex serializes all access. Reads acquire the lock briefly to clone
/// the tokens, so request-time reads don't block on an in-progress write.
pub struct CredentialStore {
    path: Option<PathBuf>,
    state: Mutex<Option<TokenPair>>,
}

impl CredentialStore {
    /// Create a store with no file backing. Starts empty.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(None),
        }
    }

    /// Load the credential from the given file path.
    ///
    /// If the file doesn't exist, creates it holding `null` (cold start
    /// with no session). Every later mutation persists to the same path.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let pair: Option<TokenPair> = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), present = pair.is_some(), "loaded credential file");
            pair
        } else {
            info!(path = %path.display(), "credential file not found, starting empty");
            write_atomic(&path, &None).await?;
            None
        };

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// Current access token, if a session exists.
    pub async fn access_token(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.as_ref().map(|p| p.access.clone())
    }

    /// Current refresh token, if a session exists.
    pub async fn refresh_token(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.as_ref().map(|p| p.refresh.clone())
    }

    /// Clone of the whole pair.
    pub async fn pair(&self) -> Option<TokenPair> {
        let state = self.state.lock().await;
        state.clone()
    }

    /// Replace the pair atomically and persist if file-backed.
    ///
    /// This is the only way tokens change: readers see either the old pair
    /// or the new one, never a mix.
    pub async fn set_pair(&self, pair: TokenPair) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = Some(pair);
        debug!("credential pair replaced");
        self.persist(&state).await
    }

    /// Drop the pair and persist the empty state if file-backed.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let had = state.take().is_some();
        if had {
            debug!("credential pair cleared");
        }
        self.persist(&state).await
    }

    /// Whether no pair is stored.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.is_none()
    }

    async fn persist(&self, state: &Option<TokenPair>) -> Result<()> {
        match &self.path {
            Some(path) => write_atomic(path, state).await,
            None => Ok(()),
        }
    }
}

/// Write the credential to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. This prevents corruption if the process crashes mid-write.
/// Sets file permissions to 0600 (owner read/write only) since the file
/// contains live tokens.
async fn write_atomic(path: &Path, data: &Option<TokenPair>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Parse(format!("serializing credential: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".credential.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    // Set 0600 permissions (unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credential");
    Ok(())
}
