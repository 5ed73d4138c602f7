//! WebSocket transport for REPL connections.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use remote_repl_core::{ApiToken, MachineName};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};
use url::Url;

use crate::{
    protocol::{ClientFrame, ServerEvent},
    transport::{Transport, TransportError},
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build the REPL endpoint for a machine from the API base URL.
///
/// `http` maps to `ws` and `https` to `wss`; WebSocket schemes are kept.
///
/// # Errors
/// Returns error for any other scheme.
pub fn repl_url(api_base: &Url, machine_name: &MachineName) -> Result<Url, TransportError> {
    let scheme = match api_base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(TransportError::InvalidRequest(format!(
                "unsupported URL scheme `{other}`"
            )));
        }
    };

    let mut url = api_base.clone();
    url.set_scheme(scheme)
        .map_err(|()| TransportError::InvalidRequest(format!("cannot use scheme `{scheme}`")))?;
    url.set_path(&format!("/v1/machine/{machine_name}/repl"));
    url.set_query(None);
    Ok(url)
}

/// Transport over one WebSocket connection.
///
/// The socket is released by [`Transport::close`] or when the transport is
/// dropped, whichever happens first.
pub struct WebSocketTransport {
    socket: Option<Socket>,
}

impl WebSocketTransport {
    /// Open a connection, passing `token` as a bearer credential in the
    /// upgrade request.
    ///
    /// # Errors
    /// Returns error if the request cannot be built or the handshake fails.
    pub async fn connect(url: &Url, token: &ApiToken) -> Result<Self, TransportError> {
        install_crypto_provider();

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(TransportError::Connect)?;
        let header = HeaderValue::from_str(&token.bearer())
            .map_err(|e| TransportError::InvalidRequest(format!("invalid token: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, header);

        let (socket, response) = connect_async(request)
            .await
            .map_err(TransportError::Connect)?;
        tracing::info!(%url, status = %response.status(), "REPL connection established");

        Ok(Self {
            socket: Some(socket),
        })
    }

    /// Whether the socket has not been released yet.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.socket.is_some()
    }
}

/// Make `ring` the process-wide rustls provider unless one is already set.
fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none()
        && rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
    {
        tracing::debug!("rustls crypto provider installed concurrently");
    }
}

fn map_ws_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::Closed
        }
        other => TransportError::WebSocket(other),
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, frame: &ClientFrame) -> Result<(), TransportError> {
        let socket = self.socket.as_mut().ok_or(TransportError::Closed)?;
        let json = frame.encode()?;
        tracing::debug!(frame = %json, "sending frame");
        socket
            .send(Message::Text(json.into()))
            .await
            .map_err(map_ws_error)
    }

    async fn recv(&mut self) -> Result<ServerEvent, TransportError> {
        loop {
            let socket = self.socket.as_mut().ok_or(TransportError::Closed)?;
            let Some(message) = socket.next().await else {
                self.socket = None;
                return Err(TransportError::Closed);
            };

            let text = match message.map_err(map_ws_error)? {
                Message::Text(text) => text.as_str().to_owned(),
                Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!("Skipping non UTF-8 binary frame: {e}");
                        continue;
                    }
                },
                Message::Close(frame) => {
                    tracing::debug!(?frame, "server closed REPL connection");
                    self.socket = None;
                    return Err(TransportError::Closed);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };

            tracing::debug!(frame = %text, "received frame");
            return Ok(ServerEvent::decode(&text)?);
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let Some(mut socket) = self.socket.take() else {
            return Ok(());
        };
        tracing::info!("closing REPL connection");
        match socket.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(TransportError::WebSocket(e)),
        }
    }
}
