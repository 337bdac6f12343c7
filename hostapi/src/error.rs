//! Host-side error type for the oracle script VM.
//!
//! `HostError` is the error returned by every fallible [`Env`](crate::Env)
//! method. It wraps an [`ErrorKind`] for failures the guest is allowed to
//! observe, and provides an `Internal` variant for host-only faults that are
//! reported as `Unknown` on the wire.

use std::fmt;

use oracle_primitives::{ErrorKind, WireCode};

/// Error returned by host capability methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// A taxonomy error, surfaced unchanged as the run's terminal error.
    Kind(ErrorKind),
    /// A host fault with no taxonomy counterpart. Surfaced as `Unknown`.
    Internal(String),
}

impl HostError {
    /// The taxonomy kind this error surfaces as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Kind(kind) => *kind,
            Self::Internal(_) => ErrorKind::Unknown,
        }
    }

    /// The wire code this error crosses the engine boundary as.
    pub fn to_wire_code(&self) -> WireCode {
        self.kind().to_wire()
    }

    /// Create a span-too-small error.
    pub fn span_too_small() -> Self {
        Self::Kind(ErrorKind::SpanTooSmall)
    }

    /// Create an error for a call made in the wrong phase.
    pub fn wrong_period_action() -> Self {
        Self::Kind(ErrorKind::WrongPeriodAction)
    }

    /// Create a too-many-external-data error.
    pub fn too_many_external_data() -> Self {
        Self::Kind(ErrorKind::TooManyExternalData)
    }

    /// Create a duplicate-external-ID error.
    pub fn duplicate_external_id() -> Self {
        Self::Kind(ErrorKind::DuplicateExternalID)
    }

    /// Create a bad-validator-index error.
    pub fn bad_validator_index() -> Self {
        Self::Kind(ErrorKind::BadValidatorIndex)
    }

    /// Create a bad-external-ID error.
    pub fn bad_external_id() -> Self {
        Self::Kind(ErrorKind::BadExternalID)
    }

    /// Create an unavailable-external-data error.
    pub fn unavailable_external_data() -> Self {
        Self::Kind(ErrorKind::UnavailableExternalData)
    }

    /// Create an error for setting the return data twice.
    pub fn repeat_set_return_data() -> Self {
        Self::Kind(ErrorKind::RepeatSetReturnData)
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => write!(f, "host error: {} (code {})", kind, kind.to_wire()),
            Self::Internal(msg) => write!(f, "internal host error: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

impl From<ErrorKind> for HostError {
    fn from(kind: ErrorKind) -> Self {
        Self::Kind(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passthrough() {
        let err = HostError::Kind(ErrorKind::OutOfGas);
        assert_eq!(err.kind(), ErrorKind::OutOfGas);
        assert_eq!(err.to_wire_code(), WireCode(12));
    }

    #[test]
    fn test_internal_maps_to_unknown() {
        let err = HostError::Internal("ledger poisoned".into());
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.to_wire_code(), WireCode(255));
    }

    #[test]
    fn test_convenience_constructors() {
        let cases = [
            (HostError::span_too_small(), 1),
            (HostError::wrong_period_action(), 128),
            (HostError::too_many_external_data(), 129),
            (HostError::duplicate_external_id(), 130),
            (HostError::bad_validator_index(), 131),
            (HostError::bad_external_id(), 132),
            (HostError::unavailable_external_data(), 133),
            (HostError::repeat_set_return_data(), 134),
        ];
        for (err, code) in cases {
            assert_eq!(err.to_wire_code(), WireCode(code));
        }
    }

    #[test]
    fn test_display() {
        let s = HostError::bad_external_id().to_string();
        assert!(s.contains("bad external id"));
        assert!(s.contains("132"));

        let s = HostError::Internal("disk full".into()).to_string();
        assert!(s.contains("disk full"));
    }

    #[test]
    fn test_from_error_kind() {
        let err: HostError = ErrorKind::WrongPeriodAction.into();
        assert_eq!(err, HostError::wrong_period_action());
    }
}
