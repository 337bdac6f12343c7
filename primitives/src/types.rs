//! Core types and constants shared by the host API and the VM.

use core::fmt;

use serde::{Deserialize, Serialize};

/// 32-byte BLAKE3 content address of a compiled artifact.
pub type Hash = [u8; 32];

/// Identifier a guest assigns to one external data request.
pub type ExternalId = i64;

/// Identifier of the data source an external request is addressed to.
pub type DataSourceId = i64;

/// Index of a validator in the execute-phase report list.
pub type ValidatorIndex = i64;

/// Import module every host function lives in.
pub const HOST_MODULE: &str = "env";

/// Export the guest runs during the prepare phase.
pub const PREPARE_ENTRY: &str = "prepare";

/// Export the guest runs during the execute phase.
pub const EXECUTE_ENTRY: &str = "execute";

/// Export name of the guest's linear memory.
pub const MEMORY_EXPORT: &str = "memory";

/// Size of one WebAssembly page.
pub const WASM_PAGE_SIZE: u64 = 65_536;

/// Maximum number of linear memory pages a guest may use (32 MiB).
pub const MAX_MEMORY_PAGES: u32 = 512;

/// Maximum number of elements in the guest's one table.
pub const MAX_TABLE_ELEMENTS: u32 = 10_000;

/// Stack height limit injected into every compiled artifact.
pub const MAX_STACK_HEIGHT: u32 = 16 * 1024;

/// Which entry point a run invokes. Exactly one per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionPhase {
    /// Request external data.
    Prepare,
    /// Consume external data and produce the result.
    Execute,
}

impl ExecutionPhase {
    /// Name of the guest export this phase calls.
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::Prepare => PREPARE_ENTRY,
            Self::Execute => EXECUTE_ENTRY,
        }
    }

    /// Returns true for the phase that may request external data.
    pub fn is_prepare(self) -> bool {
        self == Self::Prepare
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry_point())
    }
}

/// An external data request recorded during prepare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequest {
    pub external_id: ExternalId,
    pub data_source_id: DataSourceId,
    pub calldata: Vec<u8>,
}

/// One validator's answer to an external data request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReport {
    pub external_id: ExternalId,
    /// `0` means `data` is usable.
    pub exit_code: u32,
    pub data: Vec<u8>,
}

impl RawReport {
    /// Returns true if the data source succeeded.
    pub fn is_available(&self) -> bool {
        self.exit_code == 0
    }
}

/// Result of a successful prepare or execute run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub gas_used: u64,
}

/// Lowercase hex of a content address, for log output.
pub fn hash_to_hex(hash: &Hash) -> String {
    use fmt::Write;
    let mut s = String::with_capacity(64);
    for byte in hash {
        let _ = write!(s, "{byte:02x}");
    }
    s
}
