//! VM runtime: Wasmtime engine, module cache, and the `OracleVm` facade.
//!
//! `OracleVm` is the main entry point. It owns one engine, one linker with
//! the host functions, one module cache, and the handle table binding
//! in-flight runs to their environments. Every call gets its own store, so
//! a VM can be shared across threads.

use std::sync::Arc;

use tracing::debug;
use wasmtime::{Config, Engine, Linker};

use oracle_hostapi::Env;
use oracle_primitives::{ErrorKind, ExecutionPhase, RunOutput};

use crate::cache::{CacheStats, ModuleCache};
use crate::compile;
use crate::config::VmConfig;
use crate::env_table::EnvTable;
use crate::error::VmError;
use crate::host_impl::HostState;
use crate::linker::create_linker;
use crate::session::Session;

const LOG_TARGET: &str = "oracle::vm";

/// Library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// The oracle script virtual machine.
pub struct OracleVm {
    engine: Engine,
    linker: Linker<HostState>,
    cache: ModuleCache,
    envs: Arc<EnvTable>,
    config: VmConfig,
}

impl OracleVm {
    /// Create a VM with its own engine and module cache.
    pub fn new(config: VmConfig) -> Result<Self, VmError> {
        config.validate()?;
        let engine = create_engine(&config)?;
        let linker = create_linker(&engine)?;
        debug!(
            target: LOG_TARGET,
            cache_capacity_kib = config.cache_capacity_kib,
            version = version(),
            "oracle vm created"
        );
        Ok(Self {
            engine,
            linker,
            cache: ModuleCache::new(config.cache_capacity_kib),
            envs: Arc::new(EnvTable::new()),
            config,
        })
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Validate and instrument `code`, returning an artifact of at most
    /// `span_size` bytes.
    pub fn compile(&self, code: &[u8], span_size: usize) -> Result<Vec<u8>, ErrorKind> {
        compile::compile(
            &self.engine,
            &self.cache,
            code,
            span_size,
            self.config.stack_height_limit,
        )
        .map_err(ErrorKind::from_wire)
    }

    /// Run the `prepare` entry point of `artifact`.
    pub fn prepare(
        &self,
        artifact: &[u8],
        gas_limit: u64,
        env: Arc<dyn Env>,
    ) -> Result<RunOutput, ErrorKind> {
        self.run(ExecutionPhase::Prepare, artifact, gas_limit, env)
    }

    /// Run the `execute` entry point of `artifact`.
    pub fn execute(
        &self,
        artifact: &[u8],
        gas_limit: u64,
        env: Arc<dyn Env>,
    ) -> Result<RunOutput, ErrorKind> {
        self.run(ExecutionPhase::Execute, artifact, gas_limit, env)
    }

    fn run(
        &self,
        phase: ExecutionPhase,
        artifact: &[u8],
        gas_limit: u64,
        env: Arc<dyn Env>,
    ) -> Result<RunOutput, ErrorKind> {
        let session = Session {
            engine: &self.engine,
            linker: &self.linker,
            cache: &self.cache,
            envs: &self.envs,
            phase,
        };
        session
            .run(artifact, gas_limit, env)
            .map_err(ErrorKind::from_wire)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Create a Wasmtime engine with deterministic configuration.
fn create_engine(config: &VmConfig) -> Result<Engine, VmError> {
    let mut wasm_config = Config::new();

    // Fuel metering backs gas
    wasm_config.consume_fuel(true);

    // Determinism enforcement
    wasm_config.wasm_threads(false);
    wasm_config.wasm_simd(false);
    wasm_config.wasm_relaxed_simd(false);
    wasm_config.wasm_multi_memory(false);
    wasm_config.wasm_memory64(false);
    wasm_config.cranelift_nan_canonicalization(true);

    wasm_config.max_wasm_stack(config.max_wasm_stack);

    Ok(Engine::new(&wasm_config)?)
}
