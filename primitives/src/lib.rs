//! `sampbridge-primitives`: foundational types for the sampbridge native call bridge.
//!
//! This crate provides the types shared by the host API and the bridge
//! runtime:
//!
//! - [`Cell`] and its float/bool/string conversions
//! - the native format descriptor codec ([`format::parse`])
//! - transfer codes for outbound calls and inbound public calls
//! - [`CallSignature`], a parsed native format paired with its transfer codes
//! - [`Value`], the managed argument slot

pub mod types;
pub mod error;
pub mod format;
pub mod signature;
pub mod value;

// Re-export commonly used types at the crate root for convenience.
pub use types::{Cell, CELL_SIZE};
pub use error::FormatError;
pub use format::{ArgKind, ArgumentDescriptor, Direction, SizeSpec};
pub use signature::{ArgCode, CallSignature, ParamCode};
pub use value::Value;
