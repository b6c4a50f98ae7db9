//! Host trait: what the bridge needs from the host process.
//!
//! The host owns the exported native table. The bridge resolves natives by
//! name once, then calls them with frames it has already marshaled; the host
//! never sees managed values.

use sampbridge_primitives::Cell;

use crate::types::{NativeAddress, NativeFrame};

/// The host process's native function table and log output.
///
/// Every call is synchronous: a native either returns or the host faults.
/// Implementations are driven from the host's single tick/event thread.
pub trait NativeHost {
    /// Find a native by exact name in the host's exported table.
    ///
    /// Returns `None` if no native of that name is exported. The table does
    /// not change after host startup, so callers may cache the result.
    fn find_native(&self, name: &str) -> Option<NativeAddress>;

    /// Call a native with a fully marshaled frame.
    ///
    /// The native may write through the frame's mutable slots (`R`, `S`,
    /// `A`). Returns the native's raw return cell.
    fn invoke_native(&mut self, native: NativeAddress, frame: &mut NativeFrame) -> Cell;

    /// Write one line to the host's server log.
    fn log_print(&mut self, message: &str);
}
