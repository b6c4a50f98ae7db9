//! Native format descriptor codec.
//!
//! A native format is a compact signature string with one letter per native
//! argument:
//!
//! | letter  | kind               | direction |
//! |---------|--------------------|-----------|
//! | `i` `d` | integer            | in        |
//! | `b`     | bool               | in        |
//! | `f`     | float              | in        |
//! | `r`     | const reference    | in        |
//! | `R`     | mutable reference  | in/out    |
//! | `s`     | const string       | in        |
//! | `S`     | mutable string     | in/out    |
//! | `a`     | const array        | in        |
//! | `A`     | mutable array      | in/out    |
//!
//! `S`, `a` and `A` must be followed by a size suffix, which `s` may also
//! carry: `[N]` is a fixed size, `[*K]` takes the size from the value of the
//! K-th argument (1-indexed) when the call is made. The indexed form is kept
//! symbolic here; the dispatcher resolves it per invocation.
//!
//! This text format is shared with existing host integrations and must stay
//! bit-exact.

use std::fmt;

use crate::error::FormatError;

/// What a native argument is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Int,
    Bool,
    Float,
    ConstRef,
    MutRef,
    ConstString,
    MutString,
    ConstArray,
    MutArray,
}

impl ArgKind {
    /// Every kind, in the order of the format table.
    pub const ALL: [ArgKind; 9] = [
        Self::Int,
        Self::Bool,
        Self::Float,
        Self::ConstRef,
        Self::MutRef,
        Self::ConstString,
        Self::MutString,
        Self::ConstArray,
        Self::MutArray,
    ];

    /// Map a format letter to its kind. `d` is an alias of `i`.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'i' | 'd' => Some(Self::Int),
            'b' => Some(Self::Bool),
            'f' => Some(Self::Float),
            'r' => Some(Self::ConstRef),
            'R' => Some(Self::MutRef),
            's' => Some(Self::ConstString),
            'S' => Some(Self::MutString),
            'a' => Some(Self::ConstArray),
            'A' => Some(Self::MutArray),
            _ => None,
        }
    }

    /// Canonical letter for this kind.
    pub fn letter(self) -> char {
        match self {
            Self::Int => 'i',
            Self::Bool => 'b',
            Self::Float => 'f',
            Self::ConstRef => 'r',
            Self::MutRef => 'R',
            Self::ConstString => 's',
            Self::MutString => 'S',
            Self::ConstArray => 'a',
            Self::MutArray => 'A',
        }
    }

    /// Direction implied by the kind.
    pub fn direction(self) -> Direction {
        match self {
            Self::MutRef | Self::MutString | Self::MutArray => Direction::InOut,
            _ => Direction::In,
        }
    }

    /// Passed by value in a single cell.
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Int | Self::Bool | Self::Float)
    }

    /// Backed by a multi-cell buffer.
    pub fn is_buffer(self) -> bool {
        matches!(
            self,
            Self::ConstString | Self::MutString | Self::ConstArray | Self::MutArray
        )
    }

    /// A size suffix is mandatory.
    pub fn requires_size(self) -> bool {
        matches!(self, Self::MutString | Self::ConstArray | Self::MutArray)
    }
}

/// Data flow across the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    /// The native side writes the argument back.
    pub fn is_output(self) -> bool {
        matches!(self, Self::Out | Self::InOut)
    }
}

/// Size of a buffer argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeSpec {
    None,
    /// `[N]`
    Fixed(usize),
    /// `[*K]`, 1-indexed.
    ArgIndexed(usize),
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Fixed(n) => write!(f, "[{}]", n),
            Self::ArgIndexed(k) => write!(f, "[*{}]", k),
        }
    }
}

/// One parsed native argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgumentDescriptor {
    kind: ArgKind,
    direction: Direction,
    size: SizeSpec,
}

impl ArgumentDescriptor {
    /// Build a descriptor, enforcing the same size rules as [`parse`].
    pub fn new(kind: ArgKind, size: SizeSpec) -> Result<Self, FormatError> {
        check_size(kind, size, 0)?;
        Ok(Self {
            kind,
            direction: kind.direction(),
            size,
        })
    }

    pub fn kind(&self) -> ArgKind {
        self.kind
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn size(&self) -> SizeSpec {
        self.size
    }
}

impl fmt::Display for ArgumentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.size)
    }
}

/// Parse a native format string into its descriptors.
pub fn parse(spec: &str) -> Result<Vec<ArgumentDescriptor>, FormatError> {
    let mut descriptors = Vec::new();
    let mut chars = spec.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        let kind = ArgKind::from_letter(c)
            .ok_or(FormatError::UnknownKind { position, found: c })?;

        let size = match chars.peek() {
            Some(&(open, '[')) => {
                chars.next();
                let mut body = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    body.push(c);
                }
                if !closed {
                    return Err(FormatError::UnterminatedSize { position: open });
                }
                parse_size_body(&body, open)?
            }
            _ => SizeSpec::None,
        };

        check_size(kind, size, position)?;
        descriptors.push(ArgumentDescriptor {
            kind,
            direction: kind.direction(),
            size,
        });
    }

    Ok(descriptors)
}

/// Serialize descriptors back to canonical format text.
pub fn to_format_string(descriptors: &[ArgumentDescriptor]) -> String {
    descriptors.iter().map(|d| d.to_string()).collect()
}

fn check_size(kind: ArgKind, size: SizeSpec, position: usize) -> Result<(), FormatError> {
    match size {
        SizeSpec::None if kind.requires_size() => Err(FormatError::MissingSize {
            position,
            kind: kind.letter(),
        }),
        SizeSpec::Fixed(_) | SizeSpec::ArgIndexed(_) if !kind.is_buffer() => {
            Err(FormatError::UnexpectedSize {
                position,
                kind: kind.letter(),
            })
        }
        SizeSpec::ArgIndexed(0) => Err(FormatError::InvalidSize {
            position,
            text: "*0".into(),
        }),
        _ => Ok(()),
    }
}

fn parse_size_body(body: &str, position: usize) -> Result<SizeSpec, FormatError> {
    let invalid = || FormatError::InvalidSize {
        position,
        text: body.to_string(),
    };

    let (indexed, digits) = match body.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let n: usize = digits.parse().map_err(|_| invalid())?;

    if indexed {
        if n == 0 {
            return Err(invalid());
        }
        Ok(SizeSpec::ArgIndexed(n))
    } else {
        Ok(SizeSpec::Fixed(n))
    }
}
