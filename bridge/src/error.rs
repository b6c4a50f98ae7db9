//! Bridge error types.

use std::path::PathBuf;

use sampbridge_hostapi::HostError;
use sampbridge_primitives::FormatError;

/// Top-level error type for the bridge crate.
///
/// Everything except router rejections is propagated to the caller: a
/// marshaling error that was swallowed could let a bad frame reach the host.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Native format or transfer codes failed to parse.
    #[error("malformed format: {0}")]
    MalformedFormat(#[from] FormatError),

    /// The host exports no native of this name.
    #[error("unknown native '{0}'")]
    UnknownNative(String),

    /// Argument vector length differs from the signature.
    #[error("argument count mismatch: expected {expected}, got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },

    /// More native arguments than the host frame can hold.
    #[error("too many native arguments: {got} (max {max})")]
    TooManyArguments { got: usize, max: usize },

    /// A buffer size could not be resolved for argument `index` (0-based).
    #[error("cannot resolve size of argument {index}: {reason}")]
    SizeResolution { index: usize, reason: String },

    /// Handle was never issued by the registry.
    #[error("invalid native handle {0}")]
    InvalidHandle(i32),

    /// Input-only argument `index` was passed as null.
    #[error("argument {index} is null but '{kind}' requires a value")]
    NullArgument { index: usize, kind: char },

    /// Managed value or transfer code does not fit the native argument.
    #[error("argument {index}: '{code}' with a {found} value cannot feed native '{kind}'")]
    ArgumentType {
        index: usize,
        code: char,
        kind: char,
        found: &'static str,
    },

    /// Pool already holds a live instance for this id.
    #[error("id {0} is already registered")]
    DuplicateId(i32),

    /// Pool holds no instance for this id.
    #[error("id {0} is not registered")]
    NotFound(i32),

    /// A create native returned the entity's invalid id.
    #[error("{native} returned an invalid id")]
    HostRejected { native: &'static str },

    /// No public call of this name is defined.
    #[error("no public call named '{0}'")]
    UnknownPublicCall(String),

    /// Codepage file could not be read.
    #[error("codepage '{name}' not found at {}", path.display())]
    CodepageNotFound {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Host memory access failed.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Error log could not be written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
