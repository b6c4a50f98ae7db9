//! The host cell type and its conversions.
//!
//! Every native argument travels as a 32-bit cell. Floats are passed as their
//! IEEE-754 bit pattern, bools as `0` / `1`, and strings unpacked: one byte
//! per cell, terminated by a zero cell.

/// A host machine word.
pub type Cell = i32;

/// Size of a cell in bytes.
pub const CELL_SIZE: usize = 4;

/// Reinterpret a float as a cell.
pub fn float_to_cell(v: f32) -> Cell {
    v.to_bits() as Cell
}

/// Reinterpret a cell as a float.
pub fn cell_to_float(c: Cell) -> f32 {
    f32::from_bits(c as u32)
}

/// Encode a bool as exactly `0` or `1`.
pub fn bool_to_cell(v: bool) -> Cell {
    if v { 1 } else { 0 }
}

/// Any non-zero cell is true.
pub fn cell_to_bool(c: Cell) -> bool {
    c != 0
}

/// Unpack a byte string into cells, appending the zero terminator.
///
/// Bytes are zero-extended, so codepage bytes above `0x7F` stay positive.
pub fn bytes_to_cells(bytes: &[u8]) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(bytes.len() + 1);
    cells.extend(bytes.iter().map(|&b| b as Cell));
    cells.push(0);
    cells
}

/// Collect the bytes of an unpacked string, stopping at the first zero cell.
///
/// Only the low byte of each cell is kept.
pub fn cells_to_bytes(cells: &[Cell]) -> Vec<u8> {
    cells
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| (c & 0xFF) as u8)
        .collect()
}
