//! Core types for the remote REPL client.
//!
//! This crate provides the shared building blocks:
//! - `RequestId` / `InstructionId` / `MachineName` - wire identifiers
//! - `ApiToken` - opaque bearer credential
//! - `Instruction` / `ExecResult` / `OutputChunk` - execution payloads
//! - `CredentialStore` trait

pub mod ids;
pub mod instruction;
pub mod output;
pub mod token;
pub mod traits;

pub use ids::{InstructionId, MachineName, RequestId};
pub use instruction::{ExecOutcome, ExecResult, Instruction};
pub use output::{OutputChunk, OutputStream, StandardOutput};
pub use token::ApiToken;
pub use traits::{CredentialError, CredentialStore, Credentials};
