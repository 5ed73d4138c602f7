//! Output chunks streamed while an instruction runs.

use serde::{Deserialize, Serialize};

/// Which standard stream a chunk was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    #[default]
    Stdout,
    Stderr,
}

/// Structured chunk with stream and ordering information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardOutput {
    pub stream: OutputStream,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

/// One chunk of output.
///
/// Servers send either bare text (treated as stdout) or a structured
/// [`StandardOutput`] object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputChunk {
    Text(String),
    Structured(StandardOutput),
}

impl OutputChunk {
    /// Chunk text.
    #[must_use]
    pub fn data(&self) -> &str {
        match self {
            Self::Text(data) | Self::Structured(StandardOutput { data, .. }) => data,
        }
    }

    /// Stream the chunk belongs to.
    #[must_use]
    pub const fn stream(&self) -> OutputStream {
        match self {
            Self::Text(_) => OutputStream::Stdout,
            Self::Structured(out) => out.stream,
        }
    }

    /// Consume the chunk, keeping only its text.
    #[must_use]
    pub fn into_data(self) -> String {
        match self {
            Self::Text(data) | Self::Structured(StandardOutput { data, .. }) => data,
        }
    }
}

impl From<&str> for OutputChunk {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OutputChunk {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
