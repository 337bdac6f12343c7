//! Shared test helpers for integration tests.
//!
//! Provides a WAT script template importing every host function, VM factory
//! functions, and environment builders used across all integration test
//! files.

#![allow(dead_code)]

use std::sync::Arc;

use oracle_hostapi::MockEnv;
use oracle_vm::{OracleVm, VmConfig};

/// Span size used when compiling scripts (1 MiB).
pub const COMPILE_SPAN: usize = 1024 * 1024;

/// Span size of the environments handed to runs.
pub const ENV_SPAN: i64 = 1024;

/// Gas limit generous enough for every script that is not testing gas.
pub const GAS: u64 = 100_000_000_000_000;

/// Address of the `"beeb"` data segment in [`script`] modules.
pub const BEEB_PTR: i64 = 1024;

/// Every host function import, named for use in function bodies.
pub const IMPORTS: &str = r#"
    (import "env" "get_span_size" (func $get_span_size (result i64)))
    (import "env" "read_calldata" (func $read_calldata (param i64) (result i64)))
    (import "env" "set_return_data" (func $set_return_data (param i64 i64)))
    (import "env" "get_ask_count" (func $get_ask_count (result i64)))
    (import "env" "get_min_count" (func $get_min_count (result i64)))
    (import "env" "get_prepare_time" (func $get_prepare_time (result i64)))
    (import "env" "get_execute_time" (func $get_execute_time (result i64)))
    (import "env" "get_ans_count" (func $get_ans_count (result i64)))
    (import "env" "ask_external_data" (func $ask_external_data (param i64 i64 i64 i64)))
    (import "env" "get_external_data_status" (func $get_external_data_status (param i64 i64) (result i64)))
    (import "env" "read_external_data" (func $read_external_data (param i64 i64 i64) (result i64)))
"#;

// ── Scripts ──

/// Build a script whose entry points run the given WAT bodies.
///
/// The module imports every host function, exports 17 pages of memory, and
/// holds the bytes `"beeb"` at [`BEEB_PTR`].
pub fn script(prepare: &str, execute: &str) -> String {
    format!(
        r#"(module
            {IMPORTS}
            (memory (export "memory") 17)
            (data (i32.const 1024) "beeb")
            (func (export "prepare") {prepare})
            (func (export "execute") {execute}))"#
    )
}

/// Assemble WAT text into module bytes.
pub fn wasm(wat: &str) -> Vec<u8> {
    wat::parse_str(wat).unwrap()
}

// ── VM Factory ──

pub fn new_vm() -> OracleVm {
    OracleVm::new(VmConfig::default()).unwrap()
}

pub fn new_vm_with_config(config: VmConfig) -> OracleVm {
    OracleVm::new(config).unwrap()
}

/// Compile WAT text with the default compile span, panicking on failure.
pub fn compile(vm: &OracleVm, wat: &str) -> Vec<u8> {
    vm.compile(&wasm(wat), COMPILE_SPAN)
        .unwrap_or_else(|kind| panic!("compile failed: {kind:?}"))
}

/// Compile a [`script`] built from the given bodies.
pub fn compile_script(vm: &OracleVm, prepare: &str, execute: &str) -> Vec<u8> {
    compile(vm, &script(prepare, execute))
}

// ── Environments ──

pub fn mock_env() -> Arc<MockEnv> {
    Arc::new(MockEnv::new(ENV_SPAN))
}
