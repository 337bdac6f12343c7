//! VM configuration.

use serde::Deserialize;

use oracle_primitives::MAX_STACK_HEIGHT;

use crate::error::VmError;

/// Configuration for an [`OracleVm`](crate::OracleVm).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Module cache capacity in KiB. `0` disables caching.
    /// Default: 32 MiB.
    pub cache_capacity_kib: u32,

    /// Native stack available to guest code, in bytes.
    /// Default: 1 MiB.
    pub max_wasm_stack: usize,

    /// Deterministic stack height limit injected at compile time.
    pub stack_height_limit: u32,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            cache_capacity_kib: 32 * 1024,
            max_wasm_stack: 1024 * 1024,
            stack_height_limit: MAX_STACK_HEIGHT,
        }
    }
}

impl VmConfig {
    pub fn validate(&self) -> Result<(), VmError> {
        if self.max_wasm_stack == 0 {
            return Err(VmError::Config("max_wasm_stack must be non-zero".into()));
        }
        if self.stack_height_limit == 0 {
            return Err(VmError::Config("stack_height_limit must be non-zero".into()));
        }
        Ok(())
    }
}
