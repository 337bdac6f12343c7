//! Span protocol: byte buffers handed across the host/guest boundary.
//!
//! A `Span` is a buffer with an explicit length and capacity. The writer is
//! always the one that checks size: a write that does not fit the remaining
//! capacity fails with [`ErrorKind::SpanTooSmall`] and leaves the span
//! untouched. Readers only ever see the `len` bytes actually written.
//!
//! Two ownership modes are supported:
//!
//! - **owned-by-callee** ([`Span::with_capacity`]): the caller sizes the
//!   buffer, the callee fills it.
//! - **borrowed** ([`Span::copy_of`]): a transient copy of bytes the host
//!   keeps ownership of; its capacity equals its length.
//!
//! Releasing a span consumes it, so a released span cannot be read or
//! written again.

use crate::error::ErrorKind;

/// A bounded byte buffer crossing the host/guest boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    data: Vec<u8>,
    capacity: usize,
}

impl Span {
    /// Create an empty span that accepts at most `capacity` bytes.
    ///
    /// The backing storage grows on write; `capacity` only bounds it.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity,
        }
    }

    /// Create a full span holding a copy of `bytes`.
    pub fn copy_of(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            capacity: bytes.len(),
        }
    }

    /// Append `bytes` to the span.
    ///
    /// Fails with `SpanTooSmall` if `bytes` does not fit in the remaining
    /// capacity. Nothing is written on failure.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        if bytes.len() > self.remaining() {
            return Err(ErrorKind::SpanTooSmall);
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// An owned copy of exactly the written bytes.
    pub fn read(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// The written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Maximum number of bytes this span accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes that can still be written.
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// Take the written bytes, consuming the span.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Release the span.
    pub fn release(self) {}
}
