//! Wire protocol for REPL connections.
//!
//! Every frame is one JSON object tagged by its `type` field.

use remote_repl_core::{ExecResult, Instruction, InstructionId, MachineName, OutputChunk, RequestId};
use serde::{Deserialize, Serialize, de::Error as _};
use serde_json::Value;

/// Message from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Run an instruction.
    Exec {
        instruction: Instruction,
        request_id: RequestId,
    },
}

impl ClientFrame {
    /// Create an exec frame.
    #[must_use]
    pub const fn exec(instruction: Instruction, request_id: RequestId) -> Self {
        Self::Exec {
            instruction,
            request_id,
        }
    }

    /// Encode as a JSON text frame.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Severity of a server diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Info,
    Warn,
    Error,
}

/// Message from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Connection established on a machine.
    Connected { machine_name: MachineName },
    /// Server accepted a request and assigned it an instruction id.
    ExecReceived {
        request_id: RequestId,
        seq: InstructionId,
    },
    /// Output chunk of a running instruction.
    Output {
        instruction_id: InstructionId,
        chunk: OutputChunk,
    },
    /// Final result of an instruction.
    Result {
        instruction_id: InstructionId,
        result: ExecResult,
    },
    /// Server-reported failure.
    Error {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// Diagnostic message for the client.
    Message { message: String, level: MessageLevel },
    /// Any frame type this client does not know.
    #[serde(skip_deserializing)]
    Unknown { kind: String },
}

const KNOWN_EVENTS: &[&str] = &[
    "connected",
    "exec_received",
    "output",
    "result",
    "error",
    "message",
];

impl ServerEvent {
    /// Decode one JSON text frame.
    ///
    /// Unrecognized `type` tags decode to [`ServerEvent::Unknown`]; known tags
    /// with malformed fields are an error.
    ///
    /// # Errors
    /// Returns error if the frame is not a JSON object with a string `type`,
    /// or if a known frame type has malformed fields.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| serde_json::Error::missing_field("type"))?;

        if KNOWN_EVENTS.contains(&kind) {
            serde_json::from_value(value)
        } else {
            Ok(Self::Unknown {
                kind: kind.to_string(),
            })
        }
    }

    /// The frame's `type` tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Connected { .. } => "connected",
            Self::ExecReceived { .. } => "exec_received",
            Self::Output { .. } => "output",
            Self::Result { .. } => "result",
            Self::Error { .. } => "error",
            Self::Message { .. } => "message",
            Self::Unknown { kind } => kind,
        }
    }
}
