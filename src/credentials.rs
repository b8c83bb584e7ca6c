//! Persistent storage for the API key.
//!
//! The key lives in a small YAML map on disk under a fixed name, so the file
//! can be read, edited, or deleted by hand.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::client::API_KEY_ENV;
use crate::{Error, Result};

/// File name of the credential store inside the config directory.
pub const CREDENTIALS_FILE: &str = "credentials.yaml";

/// A YAML file holding the API key under [`API_KEY_ENV`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// A store backed by the file at `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The store under the user's config directory, if the platform has one.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("explainer").join(CREDENTIALS_FILE)))
    }

    /// Where the key is stored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `key`, replacing any stored key.
    pub fn save(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::validation(
                "API key must not be empty",
                Some("key".to_string()),
            ));
        }
        let mut entries = self.read_entries()?;
        entries.insert(API_KEY_ENV.to_string(), key.to_string());
        self.write_entries(&entries)
    }

    /// The stored key, or `None` when the file or the entry is absent.
    pub fn load(&self) -> Result<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(API_KEY_ENV)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty()))
    }

    /// Remove the stored key.  A missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(API_KEY_ENV).is_none() {
            return Ok(());
        }
        if entries.is_empty() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(Error::io(
                    format!("failed to remove {}", self.path.display()),
                    err,
                )),
            }
        } else {
            self.write_entries(&entries)
        }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(Error::io(
                    format!("failed to read {}", self.path.display()),
                    err,
                ));
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create credential directory", err))?;
        }
        let content = serde_yaml::to_string(entries)?;
        std::fs::write(&self.path, content)
            .map_err(|err| Error::io(format!("failed to write {}", self.path.display()), err))?;
        restrict_permissions(&self.path)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|err| Error::io("failed to restrict credential file permissions", err))
}

#[cfg(not(unix))]
fn restrict_permissions(_: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("nested").join(CREDENTIALS_FILE))
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(&dir).load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save("  abc123  ").unwrap();
        assert_eq!(store.load().unwrap(), Some("abc123".to_string()));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("GEMINI_API_KEY"));

        store.save("def456").unwrap();
        assert_eq!(store.load().unwrap(), Some("def456".to_string()));
    }

    #[test]
    fn blank_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let err = store.save("   ").unwrap_err();
        assert!(err.is_validation());
        assert!(!store.path().exists());
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.clear().unwrap();

        store.save("abc123").unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn clear_keeps_unrelated_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "GEMINI_API_KEY: abc\nOTHER: keep\n").unwrap();

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("OTHER"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "- not\n- a map\n").unwrap();
        assert!(store.load().is_err());
    }
}
