//! `oracle-primitives`: foundational types for the oracle script VM.
//!
//! This crate provides the span protocol, the error taxonomy with its wire
//! code mapping, gas constants, and the request/report types shared by the
//! host API and the Wasmtime-backed VM.

pub mod error;
pub mod gas;
pub mod span;
pub mod types;

// Re-export commonly used types at the crate root for convenience.
pub use error::{ErrorKind, WireCode, WIRE_TABLE};
pub use span::Span;
pub use types::{
    DataSourceId, ExecutionPhase, ExternalId, Hash, RawReport, RawRequest, RunOutput,
    ValidatorIndex, MAX_MEMORY_PAGES, MAX_STACK_HEIGHT, MAX_TABLE_ELEMENTS, WASM_PAGE_SIZE,
};
