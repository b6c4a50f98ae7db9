//! Bounds-checked reads from script heap memory.
//!
//! Public call parameters that carry strings or arrays are byte addresses
//! into the calling script's heap. Every address and length is validated
//! against the heap before access; a range that does not fit returns
//! `HostError::BadAddress` instead of reading past the end.

use sampbridge_hostapi::HostError;
use sampbridge_primitives::{Cell, CELL_SIZE};

/// Check that `len` cells starting at byte `address` fit in a heap of
/// `heap_len` cells, returning the first cell index.
pub fn validate_range(heap_len: usize, address: Cell, len: usize) -> Result<usize, HostError> {
    if address < 0 || address as usize % CELL_SIZE != 0 {
        return Err(HostError::bad_address(address, len));
    }
    let start = address as usize / CELL_SIZE;
    let end = start
        .checked_add(len)
        .ok_or_else(|| HostError::bad_address(address, len))?;
    if end > heap_len {
        return Err(HostError::bad_address(address, len));
    }
    Ok(start)
}

/// Borrow `len` cells at `address`.
pub fn read_cells(heap: &[Cell], address: Cell, len: usize) -> Result<&[Cell], HostError> {
    let start = validate_range(heap.len(), address, len)?;
    Ok(&heap[start..start + len])
}

/// Read the unpacked string at `address`, without its terminator.
pub fn read_string(heap: &[Cell], address: Cell) -> Result<Vec<u8>, HostError> {
    let start = validate_range(heap.len(), address, 1)?;
    let tail = &heap[start..];
    let end = tail
        .iter()
        .position(|&c| c == 0)
        .ok_or(HostError::UnterminatedString { address })?;
    Ok(tail[..end].iter().map(|&c| (c & 0xFF) as u8).collect())
}
