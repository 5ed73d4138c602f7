//! Identifier types used on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Client-assigned identifier for one submission.
///
/// Only used to match the server's `exec_received` acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Return this id and advance `self` to the next one.
    #[must_use]
    pub const fn post_increment(&mut self) -> Self {
        let current = *self;
        self.0 += 1;
        current
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned sequence number correlating output and result events
/// with a submitted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionId(pub u64);

impl From<u64> for InstructionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a remote machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineName(String);

impl MachineName {
    /// Placeholder name asking the server to provision a fresh machine.
    pub const NEW: &'static str = "new";

    /// Create a machine name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name that requests a new machine on connect.
    #[must_use]
    pub fn new_machine() -> Self {
        Self(Self::NEW.to_string())
    }

    /// Whether this is the "provision a new machine" placeholder.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.0 == Self::NEW
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MachineName {
    fn default() -> Self {
        Self::new_machine()
    }
}

impl From<&str> for MachineName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MachineName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::str::FromStr for MachineName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Display for MachineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
