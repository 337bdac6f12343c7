//! WASM module validation: oracle script ABI checks.
//!
//! Validates that a decoded module meets the script ABI before it is
//! instrumented or run. Checks, in order:
//!
//! 1. Exactly one defined linear memory, at most 512 initial pages, and no
//!    declared maximum (`BadMemorySection`)
//! 2. Every import is a function from `env` named in the host surface
//!    (`InvalidImports`)
//! 3. `prepare` and `execute` are exported functions (`InvalidExports`)
//!
//! Entry point signatures are checked when the entry is looked up at run
//! time (`BadEntrySignature`).

use tracing::debug;
use wasm_instrument::parity_wasm::elements::{self, External, Internal, Module};

use oracle_primitives::types::{EXECUTE_ENTRY, HOST_MODULE, PREPARE_ENTRY};
use oracle_primitives::{ErrorKind, MAX_MEMORY_PAGES};

use crate::linker::HOST_FUNCTIONS;

const LOG_TARGET: &str = "oracle::compile";

/// Exports every script must provide.
const REQUIRED_EXPORTS: [&str; 2] = [PREPARE_ENTRY, EXECUTE_ENTRY];

/// Decode raw module bytes into an editable module.
pub fn decode(code: &[u8]) -> Result<Module, ErrorKind> {
    elements::deserialize_buffer(code).map_err(|e| {
        debug!(target: LOG_TARGET, error = ?e, "cannot deserialize module");
        ErrorKind::Deserialization
    })
}

/// Run every ABI check on a decoded module.
pub fn validate_module(module: &Module) -> Result<(), ErrorKind> {
    validate_memory(module)?;
    validate_imports(module)?;
    validate_exports(module)?;
    Ok(())
}

/// Check the memory section.
fn validate_memory(module: &Module) -> Result<(), ErrorKind> {
    let imports_memory = module
        .import_section()
        .map(|s| s.entries().iter().any(|e| matches!(e.external(), External::Memory(_))))
        .unwrap_or(false);
    if imports_memory {
        debug!(target: LOG_TARGET, "memory must be defined, not imported");
        return Err(ErrorKind::BadMemorySection);
    }

    let memories = module.memory_section().map(|s| s.entries()).unwrap_or(&[]);
    let [memory] = memories else {
        debug!(target: LOG_TARGET, count = memories.len(), "module must define exactly one memory");
        return Err(ErrorKind::BadMemorySection);
    };

    let limits = memory.limits();
    if limits.initial() > MAX_MEMORY_PAGES {
        debug!(target: LOG_TARGET, initial = limits.initial(), "initial memory too large");
        return Err(ErrorKind::BadMemorySection);
    }
    if limits.maximum().is_some() {
        debug!(target: LOG_TARGET, maximum = ?limits.maximum(), "memory must not declare a maximum");
        return Err(ErrorKind::BadMemorySection);
    }
    Ok(())
}

/// Check that every import is a known `env` function.
fn validate_imports(module: &Module) -> Result<(), ErrorKind> {
    let Some(section) = module.import_section() else {
        return Ok(());
    };
    for import in section.entries() {
        let known = import.module() == HOST_MODULE
            && matches!(import.external(), External::Function(_))
            && HOST_FUNCTIONS.iter().any(|f| *f == import.field());
        if !known {
            debug!(
                target: LOG_TARGET,
                module = import.module(),
                name = import.field(),
                "import not allowed"
            );
            return Err(ErrorKind::InvalidImports);
        }
    }
    Ok(())
}

/// Check that both entry points are exported as functions.
fn validate_exports(module: &Module) -> Result<(), ErrorKind> {
    let entries = module.export_section().map(|s| s.entries()).unwrap_or(&[]);
    for name in REQUIRED_EXPORTS {
        let exported = entries
            .iter()
            .any(|e| e.field() == name && matches!(e.internal(), Internal::Function(_)));
        if !exported {
            debug!(target: LOG_TARGET, name, "missing required export");
            return Err(ErrorKind::InvalidExports);
        }
    }
    Ok(())
}
