//! Guest linear memory access with bounds checking.
//!
//! Guests pass pointers and lengths as `i64`. Every access is validated
//! against the current size of the guest's linear memory before it happens;
//! a range that does not fit fails with `MemoryOutOfBound` and leaves memory
//! untouched.

use oracle_primitives::{ErrorKind, Span};

/// Resolve `[ptr, ptr + len)` against a memory of `mem_len` bytes.
fn checked_range(mem_len: usize, ptr: i64, len: usize) -> Result<(usize, usize), ErrorKind> {
    let start = usize::try_from(ptr).map_err(|_| ErrorKind::MemoryOutOfBound)?;
    let end = start.checked_add(len).ok_or(ErrorKind::MemoryOutOfBound)?;
    if end > mem_len {
        return Err(ErrorKind::MemoryOutOfBound);
    }
    Ok((start, end))
}

/// Read a guest buffer of `len` bytes at `ptr` into a span of `capacity`.
///
/// The length is checked against the span capacity (`SpanTooSmall`) before
/// the range is checked against guest memory (`MemoryOutOfBound`).
pub fn read_span(mem: &[u8], ptr: i64, len: i64, capacity: usize) -> Result<Span, ErrorKind> {
    let len = usize::try_from(len).map_err(|_| ErrorKind::MemoryOutOfBound)?;
    if len > capacity {
        return Err(ErrorKind::SpanTooSmall);
    }
    let (start, end) = checked_range(mem.len(), ptr, len)?;
    let mut span = Span::with_capacity(capacity);
    span.write(&mem[start..end])?;
    Ok(span)
}

/// Copy the written bytes of `span` into guest memory at `ptr`.
pub fn write_span(mem: &mut [u8], ptr: i64, span: &Span) -> Result<(), ErrorKind> {
    let (start, end) = checked_range(mem.len(), ptr, span.len())?;
    mem[start..end].copy_from_slice(span.as_bytes());
    Ok(())
}
