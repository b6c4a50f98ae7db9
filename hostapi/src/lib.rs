//! `sampbridge-hostapi`: host-side interface for the sampbridge native call bridge.
//!
//! This crate defines what the bridge needs from the host process. It provides:
//!
//! - `NativeHost` trait: name resolution, native invocation, and log output
//! - `NativeFrame` / `NativeArg`: the marshaled argument frame of one native call
//! - `PublicCallFrame`: raw parameters of a host-originated public call
//! - `MemHost`: in-memory `NativeHost` for testing
//! - `HostError`: host memory access errors
//!
//! Argument packing lives in the bridge crate; this crate only fixes the
//! shapes that cross the boundary.

pub mod error;
pub mod types;
pub mod traits;
pub mod mem_host;

// Re-export commonly used types at the crate root.
pub use error::HostError;
pub use types::{NativeAddress, NativeArg, NativeFrame, PublicCallFrame};
pub use traits::NativeHost;
pub use mem_host::{MemHost, NativeCall};
