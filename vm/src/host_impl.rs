//! Per-run mutable state held in the Wasmtime Store.
//!
//! `HostState` carries the handle of the run's environment, the phase being
//! run, the span size read from the environment at the start of the run,
//! the store's resource limiter, and the first host error raised by a
//! callback.

use std::sync::Arc;

use wasmtime::{StoreLimits, StoreLimitsBuilder};

use oracle_hostapi::Env;
use oracle_primitives::{
    ErrorKind, ExecutionPhase, MAX_MEMORY_PAGES, MAX_TABLE_ELEMENTS, WASM_PAGE_SIZE,
};

use crate::env_table::{EnvHandle, EnvTable};

/// Per-run mutable state held in the Wasmtime `Store`.
///
/// Created fresh for each prepare or execute call and dropped with the
/// store when the call returns.
pub struct HostState {
    envs: Arc<EnvTable>,
    handle: EnvHandle,
    /// The entry point being run.
    pub phase: ExecutionPhase,
    /// Capacity of every span crossing the boundary in this run.
    pub span_size: usize,
    /// Memory and table limiter installed on the store.
    pub limits: StoreLimits,
    /// The error a host callback aborted the guest with.
    pub host_error: Option<ErrorKind>,
}

impl HostState {
    pub fn new(
        envs: Arc<EnvTable>,
        handle: EnvHandle,
        phase: ExecutionPhase,
        span_size: usize,
    ) -> Self {
        let limits = StoreLimitsBuilder::new()
            .memory_size(MAX_MEMORY_PAGES as usize * WASM_PAGE_SIZE as usize)
            .memories(1)
            .table_elements(MAX_TABLE_ELEMENTS as usize)
            .tables(1)
            .instances(1)
            .build();
        Self {
            envs,
            handle,
            phase,
            span_size,
            limits,
            host_error: None,
        }
    }

    /// The environment of this run.
    ///
    /// Only fails if the registration was dropped while the guest was still
    /// running, which the session never allows.
    pub fn env(&self) -> Result<Arc<dyn Env>, ErrorKind> {
        self.envs.lookup(self.handle).ok_or(ErrorKind::Unknown)
    }

    /// Record `kind` as the run's terminal error. The first error wins.
    pub fn record_error(&mut self, kind: ErrorKind) {
        self.host_error.get_or_insert(kind);
    }
}
