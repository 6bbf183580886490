use crate::common::error::{CoreError, Result};
use crate::domain::AuthToken;
use crate::storage::traits::TokenStore;
use std::sync::{Mutex, MutexGuard};

/// Process-local token store for tests and one-shot sessions
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<AuthToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }

    fn slot(&self) -> Result<MutexGuard<'_, Option<AuthToken>>> {
        self.token.lock().map_err(|e| CoreError::TokenStore {
            message: format!("token lock poisoned: {}", e),
        })
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<AuthToken>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, token: &AuthToken) -> Result<()> {
        *self.slot()? = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}
