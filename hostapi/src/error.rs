//! Host-side error types.
//!
//! Raised when bridge code reads host memory that a public call pointed at.
//! Out-of-range reads are refused instead of being performed.

use sampbridge_primitives::Cell;

/// Host memory access error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The address is negative, misaligned, or the range runs past the heap.
    #[error("bad heap address {address} (length {len} cells)")]
    BadAddress { address: Cell, len: usize },

    /// No zero cell before the end of the heap.
    #[error("unterminated string at heap address {address}")]
    UnterminatedString { address: Cell },
}

impl HostError {
    /// Create a bad-address error.
    pub fn bad_address(address: Cell, len: usize) -> Self {
        Self::BadAddress { address, len }
    }
}
