//! Host-side configuration and request types.
//!
//! `EnvConfig` bundles the limits an [`OracleEnv`](crate::OracleEnv)
//! enforces. `OracleRequest` is the immutable description of one oracle
//! request that both phases observe.

use serde::Deserialize;

/// Limits enforced by the production environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Maximum size of any buffer crossing the boundary.
    pub span_size: usize,
    /// Maximum number of external data requests per prepare run.
    pub max_raw_requests: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            span_size: 1024,
            max_raw_requests: 16,
        }
    }
}

/// The request a script runs for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OracleRequest {
    pub calldata: Vec<u8>,
    /// Number of validators asked to report.
    pub ask_count: i64,
    /// Minimum number of reports needed to execute.
    pub min_count: i64,
    /// Time the request was prepared, in seconds.
    pub prepare_time: i64,
}
