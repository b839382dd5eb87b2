//! Process-wide session state.
//!
//! One `Session` holds the auth token for the whole process. The gateway
//! reads it for every request and calls [`Session::invalidate`] on any 401;
//! the UI observes the same flag to send the user back to sign-in.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Lifetime of a stored token.
pub const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Expiring on-disk token store.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the token, dropping it if it has expired or cannot be read.
    pub fn load(&self) -> Result<Option<String>> {
        self.load_at(Utc::now())
    }

    fn load_at(&self, now: DateTime<Utc>) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read {}", self.path.display()))?;

        let stored: StoredToken = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable session file");
                self.clear()?;
                return Ok(None);
            }
        };

        if stored.expires_at <= now {
            tracing::debug!("stored session expired");
            self.clear()?;
            return Ok(None);
        }
        Ok(Some(stored.token))
    }

    pub fn save(&self, token: &str) -> Result<()> {
        self.save_at(token, Utc::now())
    }

    fn save_at(&self, token: &str, now: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredToken {
            token: token.to_string(),
            expires_at: now + Duration::days(TOKEN_LIFETIME_DAYS),
        };
        std::fs::write(&self.path, serde_json::to_string(&stored)?)
            .with_context(|| format!("Could not write {}", self.path.display()))?;
        restrict_permissions(&self.path);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[derive(Debug, Default)]
pub struct Session {
    store: Option<TokenStore>,
    token: RwLock<Option<String>>,
    invalidated: AtomicBool,
}

impl Session {
    /// Open a session backed by `store`, loading any unexpired token.
    pub fn open(store: TokenStore) -> Result<Self> {
        let token = store.load()?;
        Ok(Self {
            store: Some(store),
            token: RwLock::new(token),
            invalidated: AtomicBool::new(false),
        })
    }

    /// A session that is never persisted.
    pub fn in_memory(token: Option<String>) -> Self {
        Self {
            store: None,
            token: RwLock::new(token),
            invalidated: AtomicBool::new(false),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn sign_in(&self, token: &str) -> Result<()> {
        if let Some(ref store) = self.store {
            store.save(token)?;
        }
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.to_string());
        }
        self.invalidated.store(false, Ordering::SeqCst);
        tracing::info!("signed in");
        Ok(())
    }

    /// Explicit sign-out. Does not raise the invalidated flag.
    pub fn sign_out(&self) -> Result<()> {
        self.clear_token();
        if let Some(ref store) = self.store {
            store.clear()?;
        }
        tracing::info!("signed out");
        Ok(())
    }

    /// Drop the token after the server rejected it.
    pub fn invalidate(&self) {
        self.clear_token();
        if let Some(ref store) = self.store {
            if let Err(e) = store.clear() {
                tracing::warn!(error = %e, "could not remove session file");
            }
        }
        if !self.invalidated.swap(true, Ordering::SeqCst) {
            tracing::warn!("session rejected by server, token cleared");
        }
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }

    /// Observe and reset the invalidated flag.
    pub fn take_invalidated(&self) -> bool {
        self.invalidated.swap(false, Ordering::SeqCst)
    }

    fn clear_token(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }
}
