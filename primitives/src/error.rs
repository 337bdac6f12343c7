//! Error taxonomy for the oracle script VM.
//!
//! `ErrorKind` is the closed set of failures a compile or run can end with.
//! Every kind has exactly one wire code, the numeric form that crosses the
//! engine boundary. Both directions of the mapping are driven by a single
//! table, [`WIRE_TABLE`], indexed by the kind's discriminant.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Every way a compile, prepare, or execute call can fail.
///
/// The discriminant is the row of this kind in [`WIRE_TABLE`]; it is not the
/// wire code. Use [`ErrorKind::to_wire`] for the value that crosses the
/// engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum ErrorKind {
    // ── Boundary ──
    #[error("span too small")]
    SpanTooSmall,

    // ── Compile-time ──
    #[error("wasm validation failed")]
    Validation,
    #[error("wasm deserialization failed")]
    Deserialization,
    #[error("wasm serialization failed")]
    Serialization,
    #[error("invalid imports")]
    InvalidImports,
    #[error("invalid exports")]
    InvalidExports,
    #[error("bad memory section")]
    BadMemorySection,
    #[error("gas counter injection failed")]
    GasCounterInjection,
    #[error("stack height injection failed")]
    StackHeightInjection,

    // ── Run-time ──
    #[error("instantiation failed")]
    Instantiation,
    #[error("runtime error")]
    Runtime,
    #[error("out of gas")]
    OutOfGas,
    #[error("bad entry signature")]
    BadEntrySignature,
    #[error("memory out of bound")]
    MemoryOutOfBound,

    // ── Host-generated ──
    #[error("wrong period action")]
    WrongPeriodAction,
    #[error("too many external data requests")]
    TooManyExternalData,
    #[error("duplicate external id")]
    DuplicateExternalID,
    #[error("bad validator index")]
    BadValidatorIndex,
    #[error("bad external id")]
    BadExternalID,
    #[error("unavailable external data")]
    UnavailableExternalData,
    #[error("return data already set")]
    RepeatSetReturnData,

    // ── Catch-all ──
    #[error("unknown error")]
    Unknown,
}

/// Numeric error representation exchanged with the execution engine.
///
/// `0` means success. Codes `1..=14` originate in the engine, `128..=134`
/// in host callbacks, and `255` is the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireCode(pub i32);

impl WireCode {
    /// The success code.
    pub const OK: WireCode = WireCode(0);

    /// Returns true if this is the success code.
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// Convert to `Ok(())` for the success code, or the mapped kind otherwise.
    pub fn into_result(self) -> Result<(), ErrorKind> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(ErrorKind::from_wire(self))
        }
    }
}

impl fmt::Display for WireCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of kinds in the taxonomy.
pub const KIND_COUNT: usize = 22;

/// The one bidirectional mapping between kinds and wire codes.
///
/// Row `i` holds the kind whose discriminant is `i`. These codes are part of
/// the engine ABI and MUST NOT change.
pub const WIRE_TABLE: [(ErrorKind, i32); KIND_COUNT] = [
    (ErrorKind::SpanTooSmall, 1),
    (ErrorKind::Validation, 2),
    (ErrorKind::Deserialization, 3),
    (ErrorKind::Serialization, 4),
    (ErrorKind::InvalidImports, 5),
    (ErrorKind::InvalidExports, 6),
    (ErrorKind::BadMemorySection, 7),
    (ErrorKind::GasCounterInjection, 8),
    (ErrorKind::StackHeightInjection, 9),
    (ErrorKind::Instantiation, 10),
    (ErrorKind::Runtime, 11),
    (ErrorKind::OutOfGas, 12),
    (ErrorKind::BadEntrySignature, 13),
    (ErrorKind::MemoryOutOfBound, 14),
    (ErrorKind::WrongPeriodAction, 128),
    (ErrorKind::TooManyExternalData, 129),
    (ErrorKind::DuplicateExternalID, 130),
    (ErrorKind::BadValidatorIndex, 131),
    (ErrorKind::BadExternalID, 132),
    (ErrorKind::UnavailableExternalData, 133),
    (ErrorKind::RepeatSetReturnData, 134),
    (ErrorKind::Unknown, 255),
];

// Table rows follow discriminant order and no code is used twice or collides
// with the success code.
const _: () = {
    let mut i = 0;
    while i < KIND_COUNT {
        assert!(WIRE_TABLE[i].0 as usize == i);
        assert!(WIRE_TABLE[i].1 != 0);
        let mut j = i + 1;
        while j < KIND_COUNT {
            assert!(WIRE_TABLE[i].1 != WIRE_TABLE[j].1);
            j += 1;
        }
        i += 1;
    }
};

impl ErrorKind {
    /// Every kind, in table order.
    pub const ALL: [ErrorKind; KIND_COUNT] = {
        let mut all = [ErrorKind::Unknown; KIND_COUNT];
        let mut i = 0;
        while i < KIND_COUNT {
            all[i] = WIRE_TABLE[i].0;
            i += 1;
        }
        all
    };

    /// The wire code for this kind.
    pub fn to_wire(self) -> WireCode {
        WireCode(WIRE_TABLE[self as usize].1)
    }

    /// The kind for a wire code. Unrecognized codes, including the success
    /// code, map to [`ErrorKind::Unknown`].
    pub fn from_wire(code: WireCode) -> ErrorKind {
        WIRE_TABLE
            .iter()
            .find(|(_, c)| *c == code.0)
            .map(|(kind, _)| *kind)
            .unwrap_or(ErrorKind::Unknown)
    }

    /// Returns true for kinds raised while validating or instrumenting a module.
    pub fn is_compile_error(self) -> bool {
        matches!(
            self,
            Self::Validation
                | Self::Deserialization
                | Self::Serialization
                | Self::InvalidImports
                | Self::InvalidExports
                | Self::BadMemorySection
                | Self::GasCounterInjection
                | Self::StackHeightInjection
        )
    }

    /// Returns true for kinds raised by host callbacks.
    pub fn is_host_error(self) -> bool {
        (128..=134).contains(&self.to_wire().0)
    }
}

impl From<ErrorKind> for WireCode {
    fn from(kind: ErrorKind) -> Self {
        kind.to_wire()
    }
}
