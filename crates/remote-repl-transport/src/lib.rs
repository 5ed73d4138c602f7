//! Transport layer for remote REPL sessions.
//!
//! Provides:
//! - Wire protocol (JSON, one object per frame)
//! - `Transport` trait
//! - WebSocket transport (feature: websocket)
//! - In-memory channel transport

pub mod channel;
pub mod protocol;
pub mod transport;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use channel::{ChannelPeer, ChannelTransport};
pub use protocol::{ClientFrame, MessageLevel, ServerEvent};
pub use transport::{Transport, TransportError};

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketTransport, repl_url};
