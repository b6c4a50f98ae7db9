//! Shapes that cross the host boundary.
//!
//! A `NativeFrame` is the marshaled argument list of one native call. Const
//! strings and arrays are handed to the host as read-only views; only the
//! slots described as mutable expose `&mut` access, so a native cannot write
//! through an input-only argument.

use sampbridge_primitives::{types::cells_to_bytes, Cell};

/// Opaque address of a function in the host's native table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeAddress(usize);

impl NativeAddress {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }
}

/// One marshaled native argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeArg {
    /// `i` `d` `b` `f`: the cell itself.
    Value(Cell),
    /// `r`: read-only reference to a cell.
    Ref(Cell),
    /// `R`: reference the native may write through.
    RefMut(Cell),
    /// `s`: zero-terminated string.
    Str(Box<[Cell]>),
    /// `S`: string buffer of the resolved size.
    StrMut(Vec<Cell>),
    /// `a`: input array.
    Array(Box<[Cell]>),
    /// `A`: array buffer of the resolved size.
    ArrayMut(Vec<Cell>),
}

impl NativeArg {
    /// The scalar value, for cell-sized arguments.
    pub fn cell(&self) -> Option<Cell> {
        match self {
            Self::Value(c) | Self::Ref(c) | Self::RefMut(c) => Some(*c),
            _ => None,
        }
    }

    /// Read-only view of a buffer argument.
    pub fn buffer(&self) -> Option<&[Cell]> {
        match self {
            Self::Str(b) | Self::Array(b) => Some(&b[..]),
            Self::StrMut(b) | Self::ArrayMut(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}

/// The marshaled argument frame of a single native call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeFrame {
    args: Vec<NativeArg>,
}

impl NativeFrame {
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            args: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, arg: NativeArg) {
        self.args.push(arg);
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn args(&self) -> &[NativeArg] {
        &self.args
    }

    pub fn get(&self, index: usize) -> Option<&NativeArg> {
        self.args.get(index)
    }

    /// Scalar value of argument `index`.
    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.args.get(index).and_then(NativeArg::cell)
    }

    /// Read-only view of buffer argument `index`.
    pub fn buffer(&self, index: usize) -> Option<&[Cell]> {
        self.args.get(index).and_then(NativeArg::buffer)
    }

    /// Bytes of string argument `index`, up to its terminator.
    pub fn string_bytes(&self, index: usize) -> Option<Vec<u8>> {
        match self.args.get(index)? {
            NativeArg::Str(b) => Some(cells_to_bytes(b)),
            NativeArg::StrMut(b) => Some(cells_to_bytes(b)),
            _ => None,
        }
    }

    /// Writable cell of an `R` argument.
    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        match self.args.get_mut(index)? {
            NativeArg::RefMut(c) => Some(c),
            _ => None,
        }
    }

    /// Writable buffer of an `S` or `A` argument.
    pub fn buffer_mut(&mut self, index: usize) -> Option<&mut [Cell]> {
        match self.args.get_mut(index)? {
            NativeArg::StrMut(b) | NativeArg::ArrayMut(b) => Some(b.as_mut_slice()),
            _ => None,
        }
    }

    /// Store `bytes` into an `S` buffer, truncating to leave room for the
    /// terminator. Returns false if `index` is not a mutable string.
    pub fn write_string(&mut self, index: usize, bytes: &[u8]) -> bool {
        let buf = match self.args.get_mut(index) {
            Some(NativeArg::StrMut(b)) => b,
            _ => return false,
        };
        if buf.is_empty() {
            return true;
        }
        let n = bytes.len().min(buf.len() - 1);
        for (dst, &src) in buf.iter_mut().zip(&bytes[..n]) {
            *dst = src as Cell;
        }
        buf[n] = 0;
        true
    }

    pub fn into_args(self) -> Vec<NativeArg> {
        self.args
    }
}

/// Raw parameters of a host-originated public call.
///
/// `params` holds one cell per parameter. Strings and arrays are passed as
/// byte addresses into `heap`, which is the calling script's cell memory.
#[derive(Debug, Clone, Copy)]
pub struct PublicCallFrame<'a> {
    pub params: &'a [Cell],
    pub heap: &'a [Cell],
}

impl<'a> PublicCallFrame<'a> {
    pub fn new(params: &'a [Cell], heap: &'a [Cell]) -> Self {
        Self { params, heap }
    }

    /// A frame without heap memory, for calls that only carry scalars.
    pub fn scalars(params: &'a [Cell]) -> Self {
        Self { params, heap: &[] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_buffers_not_writable() {
        let mut frame = NativeFrame::new();
        frame.push(NativeArg::Str(vec![104, 105, 0].into_boxed_slice()));
        frame.push(NativeArg::Array(vec![1, 2].into_boxed_slice()));
        frame.push(NativeArg::Ref(7));
        assert!(frame.buffer_mut(0).is_none());
        assert!(frame.buffer_mut(1).is_none());
        assert!(frame.cell_mut(2).is_none());
        assert!(!frame.write_string(0, b"x"));
        assert_eq!(frame.string_bytes(0), Some(b"hi".to_vec()));
    }

    #[test]
    fn test_mutable_slots_writable() {
        let mut frame = NativeFrame::new();
        frame.push(NativeArg::RefMut(0));
        frame.push(NativeArg::ArrayMut(vec![0; 3]));
        *frame.cell_mut(0).unwrap() = 42;
        frame.buffer_mut(1).unwrap()[2] = 9;
        assert_eq!(frame.cell(0), Some(42));
        assert_eq!(frame.buffer(1), Some(&[0, 0, 9][..]));
    }

    #[test]
    fn test_write_string_truncates() {
        let mut frame = NativeFrame::new();
        frame.push(NativeArg::StrMut(vec![0; 4]));
        assert!(frame.write_string(0, b"hello"));
        assert_eq!(frame.buffer(0), Some(&[104, 101, 108, 0][..]));
        assert_eq!(frame.string_bytes(0), Some(b"hel".to_vec()));
    }

    #[test]
    fn test_write_string_empty_buffer() {
        let mut frame = NativeFrame::new();
        frame.push(NativeArg::StrMut(Vec::new()));
        assert!(frame.write_string(0, b"abc"));
        assert_eq!(frame.buffer(0), Some(&[][..]));
    }

    #[test]
    fn test_scalar_accessors() {
        let mut frame = NativeFrame::with_capacity(2);
        frame.push(NativeArg::Value(5));
        frame.push(NativeArg::ArrayMut(vec![1]));
        assert_eq!(frame.cell(0), Some(5));
        assert_eq!(frame.cell(1), None);
        assert_eq!(frame.cell(9), None);
        assert_eq!(frame.len(), 2);
    }
}
