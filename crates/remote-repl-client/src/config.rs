//! Client configuration resolution.

use remote_repl_core::{ApiToken, Credentials};
use url::Url;

use crate::{ApiClient, ApiError};

/// API server used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "https://api.forevervm.com";

/// Resolved server and token for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: Url,
    pub token: Option<ApiToken>,
}

impl ClientConfig {
    /// Merge explicit overrides with stored credentials.
    ///
    /// Each field takes the override when present, then the stored value,
    /// then the default. An empty token counts as absent.
    ///
    /// # Errors
    /// Returns error if [`DEFAULT_SERVER_URL`] fails to parse.
    pub fn resolve(
        server_url: Option<Url>,
        token: Option<ApiToken>,
        stored: Option<Credentials>,
    ) -> Result<Self, url::ParseError> {
        let stored = stored.unwrap_or_default();
        let server_url = match server_url.or(stored.server_url) {
            Some(url) => url,
            None => Url::parse(DEFAULT_SERVER_URL)?,
        };
        let token = token
            .filter(|t| !t.is_empty())
            .or_else(|| stored.token.filter(|t| !t.is_empty()));
        Ok(Self { server_url, token })
    }

    /// Build an API client, if a token is available.
    #[must_use]
    pub fn client(&self) -> Option<ApiClient> {
        self.token
            .clone()
            .map(|token| ApiClient::new(self.server_url.clone(), token))
    }

    /// Credentials to persist after a successful login.
    #[must_use]
    pub fn credentials(&self, token: ApiToken) -> Credentials {
        Credentials::new(token, self.server_url.clone())
    }
}

/// Check `token` against the server before it is stored.
///
/// # Errors
/// Returns error if the server rejects the token or cannot be reached.
pub async fn verify_token(server_url: &Url, token: &ApiToken) -> Result<String, ApiError> {
    let client = ApiClient::new(server_url.clone(), token.clone());
    Ok(client.whoami().await?.account)
}
