//! In-memory credential storage.

use std::sync::RwLock;

use async_trait::async_trait;
use remote_repl_core::traits::{CredentialError, CredentialStore, Credentials};

/// In-memory storage implementation.
///
/// Useful for tests and for processes that get their token from the
/// environment. Data is lost on restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `credentials`.
    #[must_use]
    pub const fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: RwLock::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credentials>, CredentialError> {
        Ok(self
            .credentials
            .read()
            .map_err(|e| CredentialError::Internal(e.to_string()))?
            .clone())
    }

    async fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        *self
            .credentials
            .write()
            .map_err(|e| CredentialError::Internal(e.to_string()))? = Some(credentials.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use remote_repl_core::ApiToken;
    use url::Url;

    use super::*;

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.load().await.unwrap(), None);
        assert!(!store.clear().await.unwrap());

        let url = Url::parse("https://api.example.com").unwrap();
        store
            .save(&Credentials::new(ApiToken::new("a.b"), url.clone()))
            .await
            .unwrap();
        assert_eq!(
            store.load().await.unwrap().unwrap().token,
            Some(ApiToken::new("a.b"))
        );

        assert!(store.clear().await.unwrap());
        let cleared = store.load().await.unwrap().unwrap();
        assert_eq!(cleared.token, None);
        assert_eq!(cleared.server_url, Some(url));
    }
}
