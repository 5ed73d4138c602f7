//! Duplex transport abstraction.

use async_trait::async_trait;

use crate::protocol::{ClientFrame, ServerEvent};

/// Transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,
    #[error("Invalid connection request: {0}")]
    InvalidRequest(String),
    #[cfg(feature = "websocket")]
    #[error("Connect failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),
    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Frame codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// One persistent, exclusively owned duplex connection.
///
/// Frames go out one JSON object at a time with no batching or retry.
/// Once [`Transport::recv`] reports [`TransportError::Closed`] the transport
/// is dead; there is no reconnection.
#[async_trait]
pub trait Transport: Send {
    /// Send one frame.
    async fn send(&mut self, frame: &ClientFrame) -> Result<(), TransportError>;

    /// Wait for the next inbound frame.
    async fn recv(&mut self) -> Result<ServerEvent, TransportError>;

    /// Release the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), TransportError>;
}
