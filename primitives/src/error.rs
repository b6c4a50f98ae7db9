//! Format descriptor errors.

/// A native format or transfer-code string could not be parsed.
///
/// Offsets are byte offsets into the format string. A malformed format is a
/// registration-time error: the signature that produced it must not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Character is not one of `i d b f r R s S a A`.
    #[error("unknown format letter '{found}' at offset {position}")]
    UnknownKind { position: usize, found: char },

    /// `S`, `a` and `A` must carry `[N]` or `[*K]`.
    #[error("'{kind}' at offset {position} requires a size suffix")]
    MissingSize { position: usize, kind: char },

    /// Scalars and references never take a size suffix.
    #[error("'{kind}' at offset {position} does not take a size suffix")]
    UnexpectedSize { position: usize, kind: char },

    /// `[` without a closing `]`.
    #[error("unterminated size suffix at offset {position}")]
    UnterminatedSize { position: usize },

    /// Bracket body is not a decimal literal or `*` followed by a 1-based index.
    #[error("invalid size suffix '[{text}]' at offset {position}")]
    InvalidSize { position: usize, text: String },

    /// Character is not a known transfer code.
    #[error("unknown transfer code '{found}' at offset {position}")]
    UnknownTransferCode { position: usize, found: char },
}
