//! Account persistence
//!
//! [`AccountRecord`] is the serializable form of an account: its client
//! credential plus its token, if any. Hosts with their own settings store can
//! keep the record as JSON; [`AccountStore`] is a file-backed default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AuthError, Result};
use crate::types::{ClientCredential, OAuthToken};

/// Persisted account: credential and current token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Client registration
    pub credential: ClientCredential,
    /// Token issued for the account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<OAuthToken>,
}

impl AccountRecord {
    /// Record for a credential with no token yet
    #[must_use]
    pub fn new(credential: ClientCredential) -> Self {
        Self {
            credential,
            token: None,
        }
    }
}

/// File storage for one [`AccountRecord`]
#[derive(Debug, Clone)]
pub struct AccountStore {
    storage_path: PathBuf,
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore {
    /// Create storage with the default path (platform-specific config directory)
    #[must_use]
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("uploader-oauth");

        Self {
            storage_path: config_dir.join("account.json"),
        }
    }

    /// Create storage with a custom path
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: path.into(),
        }
    }

    /// Get the storage path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Load the stored record, `None` if nothing is stored
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if reading or parsing fails.
    pub fn load(&self) -> Result<Option<AccountRecord>> {
        if !self.storage_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.storage_path)?;
        let record = serde_json::from_str(&content)
            .map_err(|e| AuthError::storage(format!("invalid account file: {e}")))?;

        tracing::debug!(path = %self.storage_path.display(), "Loaded account");
        Ok(Some(record))
    }

    /// Save a record, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the file cannot be written.
    pub fn save(&self, record: &AccountRecord) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| AuthError::storage(format!("cannot serialize account: {e}")))?;

        std::fs::write(&self.storage_path, &content)?;

        // Holds the client secret and tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.storage_path, perms)?;
        }

        tracing::debug!(path = %self.storage_path.display(), "Saved account");
        Ok(())
    }

    /// Delete the stored record
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be deleted.
    pub fn delete(&self) -> Result<()> {
        if self.storage_path.exists() {
            std::fs::remove_file(&self.storage_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    fn record() -> AccountRecord {
        let token = OAuthToken::issue("test_access", 7200, UNIX_EPOCH + Duration::from_secs(50))
            .unwrap()
            .with_refresh_token(Some("test_refresh".to_string()))
            .with_scope(Some("submit".to_string()));
        AccountRecord {
            credential: ClientCredential::new("id", "secret", "https://localhost/cb"),
            token: Some(token),
        }
    }

    #[test]
    fn test_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::with_path(temp_dir.path().join("nested").join("account.json"));

        store.save(&record()).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, record());
        let token = loaded.token.unwrap();
        assert_eq!(token.refresh_token(), Some("test_refresh"));
        assert_eq!(token.expires_at(), 7_250);
        assert!(token.is_expired_at(SystemTime::now()));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::with_path(temp_dir.path().join("nonexistent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_record_without_token() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::with_path(temp_dir.path().join("account.json"));
        let record = AccountRecord::new(ClientCredential::new("id", "secret", "cb"));

        store.save(&record).unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("\"token\""));
        assert_eq!(store.load().unwrap(), Some(record));
    }

    #[test]
    fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("account.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AccountStore::with_path(path).load().unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::with_path(temp_dir.path().join("account.json"));

        store.delete().unwrap();
        store.save(&record()).unwrap();
        store.delete().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = AccountStore::with_path(temp_dir.path().join("account.json"));
        store.save(&record()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
