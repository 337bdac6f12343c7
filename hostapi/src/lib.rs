//! `oracle-hostapi`: host capability trait and environments for the oracle script VM.
//!
//! This crate defines the host-side interface that the VM calls back into
//! while a guest script runs. It provides:
//!
//! - `Env` trait, the eleven capabilities a guest can reach
//! - `HostError`, the host-side error type with wire code conversion
//! - `OracleEnv`, the production request ledger for prepare and execute
//! - `MockEnv`, canned answers for tests
//! - `EnvConfig` and `OracleRequest`

pub mod error;
pub mod mock_env;
pub mod oracle_env;
pub mod traits;
pub mod types;

// Re-export commonly used types at the crate root.
pub use error::HostError;
pub use mock_env::MockEnv;
pub use oracle_env::OracleEnv;
pub use traits::Env;
pub use types::{EnvConfig, OracleRequest};
