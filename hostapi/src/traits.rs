//! Host capability trait: the callbacks a guest can reach.
//!
//! `Env` is the single extension point of the VM. The VM wires one host
//! function per method into the `env` import module; those functions deal in
//! guest pointers and spans, while this trait deals in Rust slices and
//! vectors. Pointer validation and gas charging happen in the VM, not here.
//!
//! Methods take `&self` so one environment can be shared with a running
//! session through an `Arc`. Implementations that record state (the request
//! ledger, the return data) use interior mutability.

use oracle_primitives::{DataSourceId, ExternalId, ValidatorIndex};

use crate::error::HostError;

/// Host-side implementation of the oracle capability surface.
///
/// The VM holds an environment for exactly one prepare or execute run.
/// Any `Err` aborts the guest and becomes the run's terminal error.
pub trait Env: Send + Sync {
    // ── Buffers ──

    /// Maximum size of any buffer crossing the boundary during this run.
    fn get_span_size(&self) -> i64;

    /// Input bytes of the request. Immutable for the lifetime of the env.
    fn get_calldata(&self) -> Vec<u8>;

    /// Record the result of the script.
    ///
    /// Execute phase only, and at most once.
    fn set_return_data(&self, data: &[u8]) -> Result<(), HostError>;

    // ── Request metadata ──

    /// Number of validators asked to report.
    fn get_ask_count(&self) -> i64;

    /// Minimum number of reports required.
    fn get_min_count(&self) -> i64;

    /// Time the request was prepared, in seconds.
    fn get_prepare_time(&self) -> i64;

    /// Time the request is executed, in seconds. Unavailable during prepare.
    fn get_execute_time(&self) -> Result<i64, HostError>;

    /// Number of validators that reported. Unavailable during prepare.
    fn get_ans_count(&self) -> Result<i64, HostError>;

    // ── External data ──

    /// Record a request for external data. Prepare phase only.
    ///
    /// `eid` must be unique within the run, and the number of requests is
    /// bounded by the environment.
    fn ask_external_data(
        &self,
        eid: ExternalId,
        did: DataSourceId,
        data: &[u8],
    ) -> Result<(), HostError>;

    /// Exit code of validator `vid`'s answer to request `eid`.
    /// Execute phase only.
    fn get_external_data_status(
        &self,
        eid: ExternalId,
        vid: ValidatorIndex,
    ) -> Result<i64, HostError>;

    /// Data of validator `vid`'s answer to request `eid`. Execute phase only.
    ///
    /// Fails with `UnavailableExternalData` when the status is non-zero.
    fn get_external_data(
        &self,
        eid: ExternalId,
        vid: ValidatorIndex,
    ) -> Result<Vec<u8>, HostError>;
}
