//! Transfer codes and call signatures.
//!
//! The native format describes what the host function expects; the transfer
//! codes describe what the managed caller hands over in each argument slot
//! and what comes back in by-reference slots.
//!
//! Outbound (`argsFormat`):
//!
//! ```text
//! d int      f float      b bool      s string      a int[]
//! D ref int  F ref float  S ref string              A ref int[]
//! ```
//!
//! Inbound (public call formats):
//!
//! ```text
//! d int  f float  b bool  s string  D int[]  F float[]  B bool[]
//! ```

use crate::error::FormatError;
use crate::format::{self, ArgKind, ArgumentDescriptor};

/// Outbound transfer code for one managed argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgCode {
    Int,
    Float,
    Bool,
    Str,
    IntArray,
    IntRef,
    FloatRef,
    StrRef,
    IntArrayRef,
}

impl ArgCode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'd' => Some(Self::Int),
            'f' => Some(Self::Float),
            'b' => Some(Self::Bool),
            's' => Some(Self::Str),
            'a' => Some(Self::IntArray),
            'D' => Some(Self::IntRef),
            'F' => Some(Self::FloatRef),
            'S' => Some(Self::StrRef),
            'A' => Some(Self::IntArrayRef),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Int => 'd',
            Self::Float => 'f',
            Self::Bool => 'b',
            Self::Str => 's',
            Self::IntArray => 'a',
            Self::IntRef => 'D',
            Self::FloatRef => 'F',
            Self::StrRef => 'S',
            Self::IntArrayRef => 'A',
        }
    }

    /// Parse a whole `argsFormat` string.
    pub fn parse_all(text: &str) -> Result<Vec<Self>, FormatError> {
        text.char_indices()
            .map(|(position, c)| {
                Self::from_char(c).ok_or(FormatError::UnknownTransferCode { position, found: c })
            })
            .collect()
    }

    /// The slot is written back after the call.
    pub fn is_by_ref(self) -> bool {
        matches!(
            self,
            Self::IntRef | Self::FloatRef | Self::StrRef | Self::IntArrayRef
        )
    }

    /// Whether a managed slot of this code can feed a native argument of `kind`.
    pub fn accepts(self, kind: ArgKind) -> bool {
        match self {
            Self::Int => matches!(kind, ArgKind::Int | ArgKind::Bool | ArgKind::ConstRef),
            Self::Bool => matches!(kind, ArgKind::Bool | ArgKind::Int | ArgKind::ConstRef),
            Self::Float => matches!(kind, ArgKind::Float | ArgKind::ConstRef),
            Self::Str => kind == ArgKind::ConstString,
            Self::IntArray => kind == ArgKind::ConstArray,
            Self::IntRef | Self::FloatRef => kind == ArgKind::MutRef,
            Self::StrRef => kind == ArgKind::MutString,
            Self::IntArrayRef => kind == ArgKind::MutArray,
        }
    }
}

/// Inbound transfer code for one public call parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamCode {
    Int,
    Float,
    Bool,
    Str,
    IntArray,
    FloatArray,
    BoolArray,
}

impl ParamCode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'd' => Some(Self::Int),
            'f' => Some(Self::Float),
            'b' => Some(Self::Bool),
            's' => Some(Self::Str),
            'D' => Some(Self::IntArray),
            'F' => Some(Self::FloatArray),
            'B' => Some(Self::BoolArray),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Int => 'd',
            Self::Float => 'f',
            Self::Bool => 'b',
            Self::Str => 's',
            Self::IntArray => 'D',
            Self::FloatArray => 'F',
            Self::BoolArray => 'B',
        }
    }

    /// Parse a public call format string.
    pub fn parse_all(text: &str) -> Result<Vec<Self>, FormatError> {
        text.char_indices()
            .map(|(position, c)| {
                Self::from_char(c).ok_or(FormatError::UnknownTransferCode { position, found: c })
            })
            .collect()
    }

    /// The parameter is a heap address whose length comes from the entry's counts.
    pub fn is_array(self) -> bool {
        matches!(self, Self::IntArray | Self::FloatArray | Self::BoolArray)
    }
}

/// A native format paired with its outbound transfer codes.
///
/// Parsed once and reused for every call to the same native.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    native: Vec<ArgumentDescriptor>,
    args: Vec<ArgCode>,
}

impl CallSignature {
    /// Parse both halves of a signature.
    pub fn parse(native_format: &str, args_format: &str) -> Result<Self, FormatError> {
        Ok(Self {
            native: format::parse(native_format)?,
            args: ArgCode::parse_all(args_format)?,
        })
    }

    pub fn new(native: Vec<ArgumentDescriptor>, args: Vec<ArgCode>) -> Self {
        Self { native, args }
    }

    pub fn descriptors(&self) -> &[ArgumentDescriptor] {
        &self.native
    }

    pub fn arg_codes(&self) -> &[ArgCode] {
        &self.args
    }

    /// Canonical native format text.
    pub fn native_format(&self) -> String {
        format::to_format_string(&self.native)
    }

    /// Transfer code text.
    pub fn args_format(&self) -> String {
        self.args.iter().map(|c| c.as_char()).collect()
    }
}
