//! Handle table binding running sessions to their host environments.
//!
//! A Wasmtime store can only carry `'static` data, while the environment of
//! a run belongs to the caller. Each run registers its environment here
//! under a fresh [`EnvHandle`] and the store carries only the handle. Host
//! functions look the environment up by handle. The registration is removed
//! when its [`EnvRegistration`] guard drops, so an environment is never
//! reachable after its run has returned.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use oracle_hostapi::Env;

const LOG_TARGET: &str = "oracle::vm";

/// Opaque key of one registered environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvHandle(u64);

/// Environments of the runs currently in flight on one VM.
#[derive(Default)]
pub struct EnvTable {
    next: AtomicU64,
    envs: RwLock<HashMap<EnvHandle, Arc<dyn Env>>>,
}

impl EnvTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `env` for the duration of the returned guard.
    pub fn register(self: &Arc<Self>, env: Arc<dyn Env>) -> EnvRegistration {
        let handle = EnvHandle(self.next.fetch_add(1, Ordering::Relaxed));
        self.envs.write().insert(handle, env);
        trace!(target: LOG_TARGET, handle = handle.0, "env registered");
        EnvRegistration {
            table: Arc::clone(self),
            handle,
        }
    }

    /// The environment registered under `handle`, if its run is still live.
    pub fn lookup(&self, handle: EnvHandle) -> Option<Arc<dyn Env>> {
        self.envs.read().get(&handle).cloned()
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.envs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unregister(&self, handle: EnvHandle) {
        self.envs.write().remove(&handle);
        trace!(target: LOG_TARGET, handle = handle.0, "env released");
    }
}

/// Keeps an environment registered until dropped.
pub struct EnvRegistration {
    table: Arc<EnvTable>,
    handle: EnvHandle,
}

impl EnvRegistration {
    pub fn handle(&self) -> EnvHandle {
        self.handle
    }
}

impl Drop for EnvRegistration {
    fn drop(&mut self) {
        self.table.unregister(self.handle);
    }
}
