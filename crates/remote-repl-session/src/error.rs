//! Session error types.

use remote_repl_core::RequestId;
use remote_repl_transport::TransportError;

/// REPL session error.
#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    /// The connection is gone. Fatal for the session; not retried.
    #[error("Transport closed")]
    TransportClosed,
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),
    /// `submit` was called before the previous instruction finished.
    #[error("Instruction already running (request {request_id})")]
    InstructionAlreadyRunning { request_id: RequestId },
    /// The first event on a new connection was not `connected`.
    #[error("Unexpected `{kind}` event before the connection was established")]
    Handshake { kind: String },
    /// The server reported an error for the current instruction.
    #[error("REPL protocol error: {code}")]
    ReplProtocol { code: String },
}

impl From<TransportError> for ReplError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => Self::TransportClosed,
            other => Self::Transport(other),
        }
    }
}
