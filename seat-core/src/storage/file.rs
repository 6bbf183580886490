use crate::common::error::Result;
use crate::domain::AuthToken;
use crate::storage::traits::{TokenStore, AUTH_TOKEN_KEY};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Token persisted in a small JSON key/value file, the way a browser keeps it
/// in local storage. Other keys in the file are preserved.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AuthToken>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(AUTH_TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(AuthToken::new))
    }

    fn save(&self, token: &AuthToken) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(AUTH_TOKEN_KEY.to_string(), Value::String(token.as_str().to_string()));
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "saved auth token");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut entries = self.read_entries()?;
        if entries.remove(AUTH_TOKEN_KEY).is_some() {
            self.write_entries(&entries)?;
            debug!(path = %self.path.display(), "cleared auth token");
        }
        Ok(())
    }
}
