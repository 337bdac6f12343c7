//! Host function registration via Wasmtime linker.
//!
//! Registers the eleven `env` functions with the Wasmtime `Linker`. Each
//! function:
//! 1. Looks up the run's environment through the handle in `HostState`
//! 2. Validates pointer/length arguments against linear memory
//! 3. Charges gas against the store's fuel
//! 4. Calls the environment
//! 5. Copies results into guest memory through a span
//!
//! Any failure records its kind on `HostState` and traps the guest.

use std::sync::Arc;

use tracing::trace;
use wasmtime::{Caller, Linker, Memory};

use oracle_hostapi::{Env, HostError};
use oracle_primitives::gas::{
    gas_cost_ask_external_data, gas_cost_host_call, gas_to_fuel_ceil,
};
use oracle_primitives::types::{HOST_MODULE, MEMORY_EXPORT};
use oracle_primitives::{ErrorKind, ExecutionPhase, Span};

use crate::error::VmError;
use crate::host_impl::HostState;
use crate::memory;

const LOG_TARGET: &str = "oracle::vm";

/// Every function a guest may import from `env`.
pub const HOST_FUNCTIONS: [&str; 11] = [
    "get_span_size",
    "read_calldata",
    "set_return_data",
    "get_ask_count",
    "get_min_count",
    "get_prepare_time",
    "get_execute_time",
    "get_ans_count",
    "ask_external_data",
    "get_external_data_status",
    "read_external_data",
];

/// Build a linker with every host function registered.
pub fn create_linker(engine: &wasmtime::Engine) -> Result<Linker<HostState>, VmError> {
    let mut linker = Linker::new(engine);
    register_host_functions(&mut linker)?;
    Ok(linker)
}

/// Register all `env` functions with the linker.
pub fn register_host_functions(linker: &mut Linker<HostState>) -> Result<(), VmError> {
    register_get_span_size(linker)?;
    register_read_calldata(linker)?;
    register_set_return_data(linker)?;
    register_metadata(linker)?;
    register_ask_external_data(linker)?;
    register_get_external_data_status(linker)?;
    register_read_external_data(linker)?;
    Ok(())
}

// ── Helpers ──

/// Get the guest's exported memory from a Caller.
fn get_memory(caller: &mut Caller<'_, HostState>) -> Option<Memory> {
    caller.get_export(MEMORY_EXPORT).and_then(|e| e.into_memory())
}

/// Record `kind` on the run and build the error that traps the guest.
fn abort(caller: &mut Caller<'_, HostState>, kind: ErrorKind) -> anyhow::Error {
    trace!(target: LOG_TARGET, ?kind, "host call aborted");
    caller.data_mut().record_error(kind);
    anyhow::Error::new(kind)
}

fn host<T>(caller: &mut Caller<'_, HostState>, result: Result<T, HostError>) -> anyhow::Result<T> {
    result.map_err(|e| abort(caller, e.kind()))
}

fn env(caller: &mut Caller<'_, HostState>) -> anyhow::Result<Arc<dyn Env>> {
    let env = caller.data().env();
    env.map_err(|kind| abort(caller, kind))
}

/// Deduct `gas` from the store's fuel. A charge the remaining fuel cannot
/// cover drains it and fails with `OutOfGas`.
fn charge(caller: &mut Caller<'_, HostState>, gas: u64) -> anyhow::Result<()> {
    let fuel = gas_to_fuel_ceil(gas);
    let remaining = caller.get_fuel()?;
    match remaining.checked_sub(fuel) {
        Some(left) => caller.set_fuel(left),
        None => {
            caller.set_fuel(0)?;
            Err(abort(caller, ErrorKind::OutOfGas))
        }
    }
}

/// Copy a guest buffer into a span of the run's span size.
fn read_guest(caller: &mut Caller<'_, HostState>, ptr: i64, len: i64) -> anyhow::Result<Span> {
    let capacity = caller.data().span_size;
    let mem = match get_memory(caller) {
        Some(m) => m,
        None => return Err(abort(caller, ErrorKind::MemoryOutOfBound)),
    };
    let result = memory::read_span(mem.data(&*caller), ptr, len, capacity);
    result.map_err(|kind| abort(caller, kind))
}

/// Copy `data` into guest memory at `ptr` through a span of the run's span
/// size. Returns the number of bytes written.
fn write_guest(caller: &mut Caller<'_, HostState>, ptr: i64, data: &[u8]) -> anyhow::Result<i64> {
    let mut span = Span::with_capacity(caller.data().span_size);
    if let Err(kind) = span.write(data) {
        return Err(abort(caller, kind));
    }
    let mem = match get_memory(caller) {
        Some(m) => m,
        None => return Err(abort(caller, ErrorKind::MemoryOutOfBound)),
    };
    let result = memory::write_span(mem.data_mut(&mut *caller), ptr, &span);
    result.map_err(|kind| abort(caller, kind))?;
    let written = span.len();
    span.release();
    Ok(written as i64)
}

// ── Buffers ──

fn register_get_span_size(linker: &mut Linker<HostState>) -> Result<(), VmError> {
    linker.func_wrap(
        HOST_MODULE,
        "get_span_size",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
            charge(&mut caller, gas_cost_host_call(0))?;
            Ok(i64::try_from(caller.data().span_size).unwrap_or(i64::MAX))
        },
    )?;
    Ok(())
}

fn register_read_calldata(linker: &mut Linker<HostState>) -> Result<(), VmError> {
    linker.func_wrap(
        HOST_MODULE,
        "read_calldata",
        |mut caller: Caller<'_, HostState>, ptr: i64| -> anyhow::Result<i64> {
            let calldata = env(&mut caller)?.get_calldata();
            charge(&mut caller, gas_cost_host_call(calldata.len()))?;
            write_guest(&mut caller, ptr, &calldata)
        },
    )?;
    Ok(())
}

fn register_set_return_data(linker: &mut Linker<HostState>) -> Result<(), VmError> {
    linker.func_wrap(
        HOST_MODULE,
        "set_return_data",
        |mut caller: Caller<'_, HostState>, ptr: i64, len: i64| -> anyhow::Result<()> {
            let span = read_guest(&mut caller, ptr, len)?;
            charge(&mut caller, gas_cost_host_call(span.len()))?;
            let result = env(&mut caller)?.set_return_data(span.as_bytes());
            host(&mut caller, result)
        },
    )?;
    Ok(())
}

// ── Request metadata ──

fn register_metadata(linker: &mut Linker<HostState>) -> Result<(), VmError> {
    linker.func_wrap(
        HOST_MODULE,
        "get_ask_count",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
            charge(&mut caller, gas_cost_host_call(0))?;
            Ok(env(&mut caller)?.get_ask_count())
        },
    )?;
    linker.func_wrap(
        HOST_MODULE,
        "get_min_count",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
            charge(&mut caller, gas_cost_host_call(0))?;
            Ok(env(&mut caller)?.get_min_count())
        },
    )?;
    linker.func_wrap(
        HOST_MODULE,
        "get_prepare_time",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
            charge(&mut caller, gas_cost_host_call(0))?;
            Ok(env(&mut caller)?.get_prepare_time())
        },
    )?;
    linker.func_wrap(
        HOST_MODULE,
        "get_execute_time",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
            charge(&mut caller, gas_cost_host_call(0))?;
            let result = env(&mut caller)?.get_execute_time();
            host(&mut caller, result)
        },
    )?;
    linker.func_wrap(
        HOST_MODULE,
        "get_ans_count",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
            charge(&mut caller, gas_cost_host_call(0))?;
            let result = env(&mut caller)?.get_ans_count();
            host(&mut caller, result)
        },
    )?;
    Ok(())
}

// ── External data ──

fn register_ask_external_data(linker: &mut Linker<HostState>) -> Result<(), VmError> {
    linker.func_wrap(
        HOST_MODULE,
        "ask_external_data",
        |mut caller: Caller<'_, HostState>,
         eid: i64,
         did: i64,
         ptr: i64,
         len: i64|
         -> anyhow::Result<()> {
            // Rejected before any argument is looked at, whatever the env.
            if caller.data().phase == ExecutionPhase::Execute {
                return Err(abort(&mut caller, ErrorKind::WrongPeriodAction));
            }
            let span = read_guest(&mut caller, ptr, len)?;
            charge(&mut caller, gas_cost_ask_external_data(span.len()))?;
            let result = env(&mut caller)?.ask_external_data(eid, did, span.as_bytes());
            host(&mut caller, result)
        },
    )?;
    Ok(())
}

fn register_get_external_data_status(linker: &mut Linker<HostState>) -> Result<(), VmError> {
    linker.func_wrap(
        HOST_MODULE,
        "get_external_data_status",
        |mut caller: Caller<'_, HostState>, eid: i64, vid: i64| -> anyhow::Result<i64> {
            charge(&mut caller, gas_cost_host_call(0))?;
            let result = env(&mut caller)?.get_external_data_status(eid, vid);
            host(&mut caller, result)
        },
    )?;
    Ok(())
}

fn register_read_external_data(linker: &mut Linker<HostState>) -> Result<(), VmError> {
    linker.func_wrap(
        HOST_MODULE,
        "read_external_data",
        |mut caller: Caller<'_, HostState>, eid: i64, vid: i64, ptr: i64| -> anyhow::Result<i64> {
            let result = env(&mut caller)?.get_external_data(eid, vid);
            let data = host(&mut caller, result)?;
            charge(&mut caller, gas_cost_host_call(data.len()))?;
            write_guest(&mut caller, ptr, &data)
        },
    )?;
    Ok(())
}
