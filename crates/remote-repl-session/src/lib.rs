//! Execution sessions for remote REPL connections.
//!
//! Provides:
//! - `ReplSession` - submit instructions over one connection
//! - `ExecutionHandle` - pull output and the result of one instruction
//! - `ReplError`

pub mod error;
pub mod handle;
pub mod repl;

pub use error::ReplError;
pub use handle::{ExecutionHandle, ExecutionState};
pub use repl::{ReplSession, SessionState};
