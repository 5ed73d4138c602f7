//! Core traits for credential storage.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::ApiToken;

/// Persisted login state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Stored bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<ApiToken>,
    /// API server the token belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<Url>,
}

impl Credentials {
    /// Credentials for a token issued by `server_url`.
    #[must_use]
    pub const fn new(token: ApiToken, server_url: Url) -> Self {
        Self {
            token: Some(token),
            server_url: Some(server_url),
        }
    }
}

/// Credential storage error.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("No credential location available")]
    NoLocation,
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed credential file {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Trait for credential storage backends.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load stored credentials. `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<Credentials>, CredentialError>;

    /// Replace the stored credentials.
    async fn save(&self, credentials: &Credentials) -> Result<(), CredentialError>;

    /// Forget the stored token, keeping the server URL.
    ///
    /// Returns `true` if a token was removed.
    async fn clear(&self) -> Result<bool, CredentialError> {
        let Some(mut credentials) = self.load().await? else {
            return Ok(false);
        };
        if credentials.token.take().is_none() {
            return Ok(false);
        }
        self.save(&credentials).await?;
        Ok(true)
    }
}
