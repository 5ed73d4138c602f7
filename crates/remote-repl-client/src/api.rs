//! HTTP account and machine API.

use remote_repl_core::{ApiToken, MachineName};
use remote_repl_session::{ReplError, ReplSession};
use remote_repl_transport::{TransportError, WebSocketTransport, repl_url};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

const SDK_HEADER: &str = "x-remote-repl-sdk";

/// Error body returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// API client error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Api error: {}", .0.code)]
    Api(ApiErrorResponse),
    #[error("Server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("REPL error: {0}")]
    Repl(#[from] ReplError),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        Self::Repl(err.into())
    }
}

/// `GET /v1/whoami` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub account: String,
}

/// `POST /v1/machine/new` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMachineResponse {
    pub machine_name: MachineName,
}

/// A machine owned by the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMachine {
    pub name: MachineName,
    pub created_at: String,
    pub running: bool,
    pub has_pending_instruction: bool,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// `GET /v1/machine/list` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMachinesResponse {
    pub machines: Vec<ApiMachine>,
}

/// Client for the account API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    token: ApiToken,
    client: Client,
}

impl ApiClient {
    /// Create a client for `base_url` authenticated with `token`.
    #[must_use]
    pub fn new(base_url: Url, token: ApiToken) -> Self {
        Self {
            base_url,
            token,
            client: Client::new(),
        }
    }

    /// API server this client talks to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Look up the account the token belongs to.
    ///
    /// # Errors
    /// Returns error if the request fails or the token is rejected.
    pub async fn whoami(&self) -> Result<WhoamiResponse, ApiError> {
        self.request(Method::GET, "/whoami").await
    }

    /// Provision a new machine.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn create_machine(&self) -> Result<CreateMachineResponse, ApiError> {
        self.request(Method::POST, "/machine/new").await
    }

    /// List the account's machines.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_machines(&self) -> Result<ListMachinesResponse, ApiError> {
        self.request(Method::GET, "/machine/list").await
    }

    /// Open a REPL session on `machine_name`.
    ///
    /// Returns once the server has announced the machine, so the session's
    /// name is the assigned one even when [`MachineName::NEW`] was requested.
    ///
    /// # Errors
    /// Returns error if the URL cannot be derived, the connection fails, or
    /// the server does not open with a `connected` event.
    pub async fn repl(
        &self,
        machine_name: MachineName,
    ) -> Result<ReplSession<WebSocketTransport>, ApiError> {
        let url = repl_url(&self.base_url, &machine_name)?;
        let transport = WebSocketTransport::connect(&url, &self.token).await?;
        Ok(ReplSession::connect(transport, machine_name).await?)
    }

    async fn request<R: DeserializeOwned>(&self, method: Method, path: &str) -> Result<R, ApiError> {
        let url = self.base_url.join(&format!("/v1{path}"))?;
        tracing::debug!(%method, %url, "API request");

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(SDK_HEADER, "rust")
            .bearer_auth(self.token.expose());
        if method == Method::POST {
            request = request.json(&serde_json::json!({}));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(parse_error(response).await);
        }
        Ok(response.json().await?)
    }
}

async fn parse_error(response: Response) -> ApiError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return ApiError::Http(e),
    };

    serde_json::from_str::<ApiErrorResponse>(&body)
        .map_or(ApiError::Status { status, body }, ApiError::Api)
}
