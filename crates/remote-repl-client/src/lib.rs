//! Account API client and credential storage.
//!
//! Provides:
//! - `ApiClient` - whoami, machine provisioning and REPL bootstrap
//! - `ClientConfig` - server URL and token resolution
//! - Credential stores (features: memory, file)

pub mod api;
pub mod config;
pub mod storage;

pub use api::{
    ApiClient, ApiError, ApiErrorResponse, ApiMachine, CreateMachineResponse,
    ListMachinesResponse, WhoamiResponse,
};
pub use config::{ClientConfig, DEFAULT_SERVER_URL, verify_token};

#[cfg(feature = "file")]
pub use storage::FileCredentialStore;
#[cfg(feature = "memory")]
pub use storage::MemoryCredentialStore;
