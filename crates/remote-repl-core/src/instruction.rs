//! Instructions sent to a machine and the results they produce.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Code to execute on the remote machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Source code for the machine's REPL.
    pub code: String,

    /// Server-side execution timeout. Left to the server default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u32>,
}

impl Instruction {
    /// Create an instruction with the server's default timeout.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            timeout_seconds: None,
        }
    }

    /// Set an explicit execution timeout.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}

/// Return-value representation of a finished instruction.
///
/// Kept as JSON so that result shapes the client does not know about still
/// reach the caller; [`ExecResult::outcome`] interprets the usual
/// `{ "value": .., "runtime_ms": .. }` / `{ "error": .. }` forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecResult(Value);

/// Interpreted view of an [`ExecResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecOutcome<'a> {
    /// The expression evaluated; `value` is its printed representation,
    /// absent for statements without a value.
    Value {
        value: Option<&'a str>,
        data: Option<&'a Value>,
    },
    /// The code raised an error on the machine.
    Error { error: &'a str },
    /// Any other JSON value.
    Raw(&'a Value),
}

impl ExecResult {
    /// Wrap a JSON value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// The raw JSON.
    #[must_use]
    pub const fn as_json(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the raw JSON.
    #[must_use]
    pub fn into_json(self) -> Value {
        self.0
    }

    /// Interpret the result.
    #[must_use]
    pub fn outcome(&self) -> ExecOutcome<'_> {
        let Value::Object(map) = &self.0 else {
            return ExecOutcome::Raw(&self.0);
        };

        if let Some(error) = map.get("error").and_then(Value::as_str) {
            return ExecOutcome::Error { error };
        }

        if map.contains_key("value") || map.contains_key("data") {
            return ExecOutcome::Value {
                value: map.get("value").and_then(Value::as_str),
                data: map.get("data").filter(|d| !d.is_null()),
            };
        }

        ExecOutcome::Raw(&self.0)
    }

    /// Server-reported execution time, if present.
    #[must_use]
    pub fn runtime_ms(&self) -> Option<u64> {
        self.0.get("runtime_ms").and_then(Value::as_u64)
    }
}

impl From<Value> for ExecResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for ExecResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome() {
            ExecOutcome::Value { value: Some(v), .. } => f.write_str(v),
            ExecOutcome::Value { value: None, data: Some(d) } => write!(f, "{d}"),
            ExecOutcome::Value { value: None, data: None } => Ok(()),
            ExecOutcome::Error { error } => write!(f, "error: {error}"),
            ExecOutcome::Raw(raw) => write!(f, "{raw}"),
        }
    }
}
