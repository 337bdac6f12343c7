//! `oracle-vm`: Wasmtime-based virtual machine for oracle scripts.
//!
//! This crate compiles untrusted WASM oracle scripts and runs their
//! `prepare` and `execute` entry points against a host environment. It
//! enforces:
//!
//! - **Determinism:** No SIMD, no threads, NaN canonicalization
//! - **Gas metering:** Fuel-backed metering of guest compute and host calls
//! - **Stack limits:** Deterministic stack height instrumentation at compile time
//! - **Memory limits:** At most 512 pages of linear memory and one table
//!   of at most 10 000 elements
//! - **Import whitelisting:** Only the eleven `env` host functions
//! - **Phase rules:** External data can only be requested during prepare
//!
//! The primary entry point is [`OracleVm`].

pub mod cache;
pub mod compile;
pub mod config;
pub mod env_table;
pub mod error;
pub mod host_impl;
pub mod linker;
pub mod memory;
pub mod runtime;
pub mod session;
pub mod validation;

pub use cache::{CacheStats, ModuleCache};
pub use config::VmConfig;
pub use error::VmError;
pub use runtime::{version, OracleVm};

pub use oracle_hostapi::{Env, EnvConfig, HostError, MockEnv, OracleEnv, OracleRequest};
pub use oracle_primitives::{ErrorKind, ExecutionPhase, RawReport, RawRequest, RunOutput, WireCode};
