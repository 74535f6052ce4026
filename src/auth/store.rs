use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Credentials file name in the state directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Access token lifetime. The service issues short-lived access tokens;
/// anything older is treated as gone, the same way a cookie with this
/// expiry would be.
const ACCESS_TTL_HOURS: i64 = 4;

/// Refresh token lifetime (~7 days server-side).
const REFRESH_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CredentialFile {
    access: Option<StoredToken>,
    refresh: Option<StoredToken>,
}

/// Tokens surviving a load, with expired slots already dropped.
#[derive(Debug, Clone, Default)]
pub struct StoredPair {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

/// Persisted credential store - the cookie-equivalent for a native
/// client. Each slot carries its own expiry and loading silently drops
/// anything past it. Exclusively written by the session manager.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    state_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    /// Load the persisted pair, dropping any expired slot.
    pub fn load(&self) -> Result<StoredPair> {
        let file = self.read_file()?;
        Ok(StoredPair {
            access: file
                .access
                .filter(|t| !t.is_expired())
                .map(|t| t.value),
            refresh: file
                .refresh
                .filter(|t| !t.is_expired())
                .map(|t| t.value),
        })
    }

    /// Persist a freshly issued access/refresh pair with full lifetimes.
    pub fn store_pair(&self, access: &str, refresh: &str) -> Result<()> {
        let now = Utc::now();
        self.write_file(&CredentialFile {
            access: Some(StoredToken {
                value: access.to_string(),
                expires_at: now + Duration::hours(ACCESS_TTL_HOURS),
            }),
            refresh: Some(StoredToken {
                value: refresh.to_string(),
                expires_at: now + Duration::days(REFRESH_TTL_DAYS),
            }),
        })
    }

    /// Replace only the access token (after a refresh), keeping the
    /// stored refresh token and its original expiry.
    pub fn store_access(&self, access: &str) -> Result<()> {
        let mut file = self.read_file()?;
        file.access = Some(StoredToken {
            value: access.to_string(),
            expires_at: Utc::now() + Duration::hours(ACCESS_TTL_HOURS),
        });
        self.write_file(&file)
    }

    /// Remove all persisted credentials.
    pub fn clear(&self) -> Result<()> {
        let path = self.credentials_path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove credentials file")?;
        }
        Ok(())
    }

    fn read_file(&self) -> Result<CredentialFile> {
        let path = self.credentials_path();
        if !path.exists() {
            return Ok(CredentialFile::default());
        }
        let contents =
            std::fs::read_to_string(&path).context("Failed to read credentials file")?;
        serde_json::from_str(&contents).context("Failed to parse credentials file")
    }

    fn write_file(&self, file: &CredentialFile) -> Result<()> {
        let path = self.credentials_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(file)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn credentials_path(&self) -> PathBuf {
        self.state_dir.join(CREDENTIALS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = CredentialStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let (_dir, store) = temp_store();
        let pair = store.load().expect("Load failed");
        assert!(pair.access.is_none());
        assert!(pair.refresh.is_none());
    }

    #[test]
    fn test_roundtrip_pair() {
        let (_dir, store) = temp_store();
        store.store_pair("acc-1", "ref-1").expect("Store failed");

        let pair = store.load().expect("Load failed");
        assert_eq!(pair.access.as_deref(), Some("acc-1"));
        assert_eq!(pair.refresh.as_deref(), Some("ref-1"));
    }

    #[test]
    fn test_store_access_keeps_refresh() {
        let (_dir, store) = temp_store();
        store.store_pair("acc-1", "ref-1").expect("Store failed");
        store.store_access("acc-2").expect("Store failed");

        let pair = store.load().expect("Load failed");
        assert_eq!(pair.access.as_deref(), Some("acc-2"));
        assert_eq!(pair.refresh.as_deref(), Some("ref-1"));
    }

    #[test]
    fn test_expired_slots_are_dropped() {
        let (dir, store) = temp_store();

        // Write a file with an already-expired access token by hand
        let file = CredentialFile {
            access: Some(StoredToken {
                value: "stale-acc".to_string(),
                expires_at: Utc::now() - Duration::minutes(1),
            }),
            refresh: Some(StoredToken {
                value: "ref-1".to_string(),
                expires_at: Utc::now() + Duration::days(1),
            }),
        };
        let path = dir.path().join(CREDENTIALS_FILE);
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let pair = store.load().expect("Load failed");
        assert!(pair.access.is_none());
        assert_eq!(pair.refresh.as_deref(), Some("ref-1"));
    }

    #[test]
    fn test_clear_removes_file() {
        let (dir, store) = temp_store();
        store.store_pair("acc-1", "ref-1").expect("Store failed");
        assert!(dir.path().join(CREDENTIALS_FILE).exists());

        store.clear().expect("Clear failed");
        assert!(!dir.path().join(CREDENTIALS_FILE).exists());

        // Clearing an already-empty store is fine
        store.clear().expect("Second clear failed");
    }
}
