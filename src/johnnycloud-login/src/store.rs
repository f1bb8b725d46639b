//! Durable token storage.
//!
//! The token set is the only state shared between flow entry points, and
//! every write is a whole-value replacement so readers never observe a
//! half-written set. The file backend mirrors the browser original's
//! localStorage role: plain JSON, restricted to the owning user.

use std::path::{Path, PathBuf};

use crate::constants::TOKEN_FILE;
use crate::error::AuthError;
use crate::types::TokenSet;

/// Durable storage for the session's token set.
pub trait TokenStore: Send {
    /// Load the current token set, `None` when logged out.
    fn load(&self) -> Result<Option<TokenSet>, AuthError>;
    /// Replace the stored token set wholesale.
    fn save(&mut self, tokens: &TokenSet) -> Result<(), AuthError>;
    /// Remove any stored token set.
    fn clear(&mut self) -> Result<(), AuthError>;
}

/// In-memory store for embedders that manage persistence themselves and
/// for tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Option<TokenSet>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        Ok(self.tokens.clone())
    }

    fn save(&mut self, tokens: &TokenSet) -> Result<(), AuthError> {
        self.tokens = Some(tokens.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), AuthError> {
        self.tokens = None;
        Ok(())
    }
}

/// File-backed store: `{home}/tokens.json` with owner-only permissions.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store tokens under the given application home directory.
    pub fn new(home: impl AsRef<Path>) -> Self {
        Self {
            path: home.as_ref().join(TOKEN_FILE),
        }
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AuthError::Storage(format!("read {}: {e}", self.path.display())))?;
        let tokens: TokenSet = serde_json::from_str(&content)
            .map_err(|e| AuthError::Storage(format!("parse {}: {e}", self.path.display())))?;
        Ok(Some(tokens))
    }

    fn save(&mut self, tokens: &TokenSet) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AuthError::Storage(format!("create {}: {e}", parent.display())))?;
        }

        let json = serde_json::to_string_pretty(tokens)
            .map_err(|e| AuthError::Storage(format!("serialize tokens: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| AuthError::Storage(format!("write {}: {e}", self.path.display())))?;
        set_file_permissions(&self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), AuthError> {
        if !self.path.exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)
            .map_err(|e| AuthError::Storage(format!("delete {}: {e}", self.path.display())))
    }
}

/// Set restrictive file permissions (0600 on Unix).
fn set_file_permissions(path: &Path) -> Result<(), AuthError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .map_err(|e| AuthError::Storage(format!("permissions {}: {e}", path.display())))?;
    }

    #[cfg(not(unix))]
    {
        let _ = path;
    }

    Ok(())
}
