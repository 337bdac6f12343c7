//! Compile pipeline: raw script bytes to a registered artifact.
//!
//! Stages run in order and the first failure wins:
//!
//! | Stage | Failure |
//! |---|---|
//! | Wasmtime validation under the VM's feature set | `Validation` |
//! | Decode into an editable module | `Deserialization` |
//! | Memory, import and export checks | see [`validation`](crate::validation) |
//! | Deterministic stack height instrumentation | `StackHeightInjection` |
//! | Re-encode | `Serialization` |
//! | Artifact fits the caller's span | `SpanTooSmall` |
//!
//! The artifact is registered in the module cache under its content
//! address, so the first run of a freshly compiled artifact is a cache hit.

use tracing::debug;
use wasm_instrument::parity_wasm::elements;
use wasmtime::{Engine, Module};

use oracle_primitives::{ErrorKind, Span, WireCode};

use crate::cache::{artifact_key, ModuleCache};
use crate::validation;

const LOG_TARGET: &str = "oracle::compile";

/// Compile `code` into an artifact of at most `span_size` bytes.
///
/// This is the engine boundary: failures leave as wire codes.
pub fn compile(
    engine: &Engine,
    cache: &ModuleCache,
    code: &[u8],
    span_size: usize,
    stack_height_limit: u32,
) -> Result<Vec<u8>, WireCode> {
    let artifact = instrument(engine, code, span_size, stack_height_limit).map_err(|kind| {
        debug!(target: LOG_TARGET, ?kind, code_len = code.len(), "compile failed");
        kind.to_wire()
    })?;
    register(engine, cache, &artifact).map_err(ErrorKind::to_wire)?;
    debug!(target: LOG_TARGET, code_len = code.len(), artifact_len = artifact.len(), "compiled");
    Ok(artifact)
}

/// Validate, check and instrument `code`, producing artifact bytes.
pub fn instrument(
    engine: &Engine,
    code: &[u8],
    span_size: usize,
    stack_height_limit: u32,
) -> Result<Vec<u8>, ErrorKind> {
    Module::validate(engine, code).map_err(|e| {
        debug!(target: LOG_TARGET, error = %e, "wasm validation failed");
        ErrorKind::Validation
    })?;

    let module = validation::decode(code)?;
    validation::validate_module(&module)?;

    let module = wasm_instrument::inject_stack_limiter(module, stack_height_limit).map_err(|e| {
        debug!(target: LOG_TARGET, error = ?e, "cannot inject the stack limiter");
        ErrorKind::StackHeightInjection
    })?;

    let bytes = elements::serialize(module).map_err(|e| {
        debug!(target: LOG_TARGET, error = ?e, "cannot serialize module");
        ErrorKind::Serialization
    })?;

    let mut span = Span::with_capacity(span_size);
    span.write(&bytes)?;
    Ok(span.into_vec())
}

/// Build the Wasmtime module for `artifact` and cache it.
fn register(engine: &Engine, cache: &ModuleCache, artifact: &[u8]) -> Result<(), ErrorKind> {
    let module = Module::new(engine, artifact).map_err(|e| {
        debug!(target: LOG_TARGET, error = %e, "cannot build module from artifact");
        ErrorKind::Deserialization
    })?;
    cache.insert(artifact_key(artifact), module, artifact.len());
    Ok(())
}

/// Build the Wasmtime module for an artifact this VM has not cached.
///
/// The artifact is decoded and checked again but not re-instrumented.
pub fn load(engine: &Engine, artifact: &[u8]) -> Result<Module, ErrorKind> {
    let module = validation::decode(artifact)?;
    validation::validate_module(&module)?;
    Module::new(engine, artifact).map_err(|e| {
        debug!(target: LOG_TARGET, error = %e, "cannot build module from artifact");
        ErrorKind::Deserialization
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
        (module
            (memory 1)
            (func $fib (param i64) (result i64)
                local.get 0
                i64.const 2
                i64.lt_s
                if (result i64)
                    local.get 0
                else
                    local.get 0
                    i64.const 1
                    i64.sub
                    call $fib
                    local.get 0
                    i64.const 2
                    i64.sub
                    call $fib
                    i64.add
                end)
            (func (export "prepare"))
            (func (export "execute")
                i64.const 10
                call $fib
                drop))
    "#;

    fn engine() -> Engine {
        Engine::default()
    }

    #[test]
    fn test_instrument_is_deterministic() {
        let code = wat::parse_str(SCRIPT).unwrap();
        let a = instrument(&engine(), &code, 1 << 20, 1024).unwrap();
        let b = instrument(&engine(), &code, 1 << 20, 1024).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, code);
    }

    #[test]
    fn test_artifact_must_fit_span() {
        let code = wat::parse_str(SCRIPT).unwrap();
        let artifact = instrument(&engine(), &code, 1 << 20, 1024).unwrap();
        assert_eq!(
            instrument(&engine(), &code, artifact.len(), 1024).unwrap(),
            artifact
        );
        assert_eq!(
            instrument(&engine(), &code, artifact.len() - 1, 1024),
            Err(ErrorKind::SpanTooSmall)
        );
    }

    #[test]
    fn test_invalid_bytes_fail_validation() {
        assert_eq!(
            instrument(&engine(), b"beeb", 1 << 20, 1024),
            Err(ErrorKind::Validation)
        );
    }

    #[test]
    fn test_compile_registers_artifact() {
        let engine = engine();
        let cache = ModuleCache::new(1024);
        let code = wat::parse_str(SCRIPT).unwrap();
        let artifact = compile(&engine, &cache, &code, 1 << 20, 1024).unwrap();
        assert!(cache.contains(&artifact_key(&artifact)));
    }

    #[test]
    fn test_compile_failure_is_wire_code() {
        let engine = engine();
        let cache = ModuleCache::new(1024);
        let code = wat::parse_str(r#"(module (func (export "prepare")) (func (export "execute")))"#)
            .unwrap();
        assert_eq!(
            compile(&engine, &cache, &code, 1 << 20, 1024),
            Err(ErrorKind::BadMemorySection.to_wire())
        );
    }

    #[test]
    fn test_load_rechecks_structure() {
        let code = wat::parse_str(r#"(module (memory 1) (func (export "prepare")))"#).unwrap();
        assert_eq!(load(&engine(), &code).err(), Some(ErrorKind::InvalidExports));
        assert_eq!(load(&engine(), b"junk").err(), Some(ErrorKind::Deserialization));
    }
}
