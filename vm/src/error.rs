//! VM construction errors.
//!
//! Compile and run failures are reported as
//! [`ErrorKind`](oracle_primitives::ErrorKind); `VmError` only covers
//! building the VM.

/// Error creating an [`OracleVm`](crate::OracleVm).
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// Wasmtime engine or linker setup failed.
    #[error("wasmtime error: {0}")]
    Engine(#[from] anyhow::Error),

    /// The configuration is unusable.
    #[error("invalid config: {0}")]
    Config(String),
}
