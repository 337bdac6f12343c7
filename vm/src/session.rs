//! Execution session: one prepare or execute run of an artifact.
//!
//! A session resolves the compiled module (cache first), registers the
//! caller's environment for the duration of the run, instantiates the module
//! in a fresh store with fuel and a resource limiter, and calls the phase's
//! entry point. Whatever happens, the store and the environment
//! registration are released before `run` returns.

use std::sync::Arc;

use tracing::{debug, trace};
use wasmtime::{Engine, Linker, Module, Store, Trap};

use oracle_hostapi::Env;
use oracle_primitives::gas::{fuel_to_gas, gas_to_fuel};
use oracle_primitives::types::hash_to_hex;
use oracle_primitives::{ErrorKind, ExecutionPhase, RunOutput, WireCode};

use crate::cache::{artifact_key, ModuleCache};
use crate::compile;
use crate::env_table::EnvTable;
use crate::host_impl::HostState;

const LOG_TARGET: &str = "oracle::vm";

/// The VM resources a run borrows.
pub struct Session<'vm> {
    pub engine: &'vm Engine,
    pub linker: &'vm Linker<HostState>,
    pub cache: &'vm ModuleCache,
    pub envs: &'vm Arc<EnvTable>,
    pub phase: ExecutionPhase,
}

impl Session<'_> {
    /// Run the phase's entry point of `artifact` with `gas_limit` gas.
    ///
    /// This is the engine boundary: failures leave as wire codes.
    pub fn run(
        self,
        artifact: &[u8],
        gas_limit: u64,
        env: Arc<dyn Env>,
    ) -> Result<RunOutput, WireCode> {
        let phase = self.phase;
        self.run_inner(artifact, gas_limit, env)
            .inspect(|out| debug!(target: LOG_TARGET, %phase, gas_used = out.gas_used, "run finished"))
            .map_err(|kind| {
                debug!(target: LOG_TARGET, %phase, ?kind, "run failed");
                kind.to_wire()
            })
    }

    fn run_inner(
        &self,
        artifact: &[u8],
        gas_limit: u64,
        env: Arc<dyn Env>,
    ) -> Result<RunOutput, ErrorKind> {
        // 1. Resolve the compiled module
        let module = self.module(artifact)?;

        // 2. Bind the environment to this run
        let span_size = usize::try_from(env.get_span_size()).unwrap_or(0);
        let registration = self.envs.register(env);
        let state = HostState::new(
            Arc::clone(self.envs),
            registration.handle(),
            self.phase,
            span_size,
        );

        // 3. Create store with limiter and fuel
        let mut store = Store::new(self.engine, state);
        store.limiter(|s| &mut s.limits);
        let fuel = gas_to_fuel(gas_limit);
        store.set_fuel(fuel).map_err(|_| ErrorKind::Unknown)?;

        // 4. Instantiate
        let instance = self
            .linker
            .instantiate(&mut store, &module)
            .map_err(|e| classify(&mut store, e, ErrorKind::Instantiation))?;

        // 5. Look up the entry point
        let entry = instance
            .get_typed_func::<(), ()>(&mut store, self.phase.entry_point())
            .map_err(|e| {
                debug!(target: LOG_TARGET, error = %e, "entry point has the wrong signature");
                ErrorKind::BadEntrySignature
            })?;

        // 6. Call it
        entry
            .call(&mut store, ())
            .map_err(|e| classify(&mut store, e, ErrorKind::Runtime))?;

        let remaining = store.get_fuel().map_err(|_| ErrorKind::Unknown)?;
        let gas_used = fuel_to_gas(fuel.saturating_sub(remaining));

        drop(store);
        drop(registration);
        Ok(RunOutput { gas_used })
    }

    fn module(&self, artifact: &[u8]) -> Result<Module, ErrorKind> {
        let key = artifact_key(artifact);
        if let Some(module) = self.cache.get(&key) {
            trace!(target: LOG_TARGET, key = %hash_to_hex(&key), "module cache hit");
            return Ok(module);
        }
        trace!(target: LOG_TARGET, key = %hash_to_hex(&key), "module cache miss");
        let module = compile::load(self.engine, artifact)?;
        self.cache.insert(key, module.clone(), artifact.len());
        Ok(module)
    }
}

/// Map an error that ended guest execution to its kind.
///
/// A host error recorded on the run takes precedence, then fuel
/// exhaustion. Everything else, trap or not, is `otherwise`: a failed
/// instantiation (including a trapping start function or an out-of-bounds
/// segment) is `Instantiation`, a failed entry call is `Runtime`.
fn classify(store: &mut Store<HostState>, err: anyhow::Error, otherwise: ErrorKind) -> ErrorKind {
    if let Some(kind) = store.data_mut().host_error.take() {
        return kind;
    }
    match err.downcast_ref::<Trap>() {
        Some(Trap::OutOfFuel) => ErrorKind::OutOfGas,
        Some(trap) => {
            trace!(target: LOG_TARGET, %trap, ?otherwise, "guest trapped");
            otherwise
        }
        None => {
            debug!(target: LOG_TARGET, error = %err, ?otherwise, "guest call failed");
            otherwise
        }
    }
}
