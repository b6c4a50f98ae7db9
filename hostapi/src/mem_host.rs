//! In-memory native host for testing.
//!
//! `MemHost` implements `NativeHost` with natives registered as closures. It
//! records every name lookup and every call (with the frame as it looked
//! before the native ran), so tests can assert on exactly what crossed the
//! boundary.

use std::cell::RefCell;
use std::collections::HashMap;

use sampbridge_primitives::Cell;

use crate::traits::NativeHost;
use crate::types::{NativeAddress, NativeArg, NativeFrame};

/// A native implemented in Rust.
pub type MemNative = Box<dyn FnMut(&mut NativeFrame) -> Cell>;

/// A recorded native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCall {
    pub name: String,
    /// Frame contents before the native ran.
    pub args: Vec<NativeArg>,
    pub result: Cell,
}

struct Entry {
    name: String,
    native: MemNative,
}

/// In-memory host with a closure-backed native table.
#[derive(Default)]
pub struct MemHost {
    natives: Vec<Entry>,
    by_name: HashMap<String, usize>,
    lookups: RefCell<Vec<String>>,
    calls: Vec<NativeCall>,
    log: Vec<String>,
}

impl MemHost {
    /// Create a host with an empty native table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a native. Re-registering a name replaces the implementation.
    pub fn register<F>(&mut self, name: &str, native: F) -> NativeAddress
    where
        F: FnMut(&mut NativeFrame) -> Cell + 'static,
    {
        if let Some(&index) = self.by_name.get(name) {
            self.natives[index].native = Box::new(native);
            return NativeAddress::new(index);
        }
        let index = self.natives.len();
        self.natives.push(Entry {
            name: name.to_string(),
            native: Box::new(native),
        });
        self.by_name.insert(name.to_string(), index);
        NativeAddress::new(index)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_native<F>(mut self, name: &str, native: F) -> Self
    where
        F: FnMut(&mut NativeFrame) -> Cell + 'static,
    {
        self.register(name, native);
        self
    }

    /// Number of `find_native` calls made for `name`, found or not.
    pub fn lookup_count(&self, name: &str) -> usize {
        self.lookups.borrow().iter().filter(|n| *n == name).count()
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> &[NativeCall] {
        &self.calls
    }

    /// Recorded calls to `name`.
    pub fn calls_to(&self, name: &str) -> Vec<&NativeCall> {
        self.calls.iter().filter(|c| c.name == name).collect()
    }

    /// Lines written through `log_print`.
    pub fn log_lines(&self) -> &[String] {
        &self.log
    }
}

impl NativeHost for MemHost {
    fn find_native(&self, name: &str) -> Option<NativeAddress> {
        self.lookups.borrow_mut().push(name.to_string());
        self.by_name.get(name).map(|&i| NativeAddress::new(i))
    }

    fn invoke_native(&mut self, native: NativeAddress, frame: &mut NativeFrame) -> Cell {
        let before = frame.args().to_vec();
        let entry = match self.natives.get_mut(native.raw()) {
            Some(e) => e,
            // Unknown address: a real host would fault here.
            None => panic!("MemHost: call to unknown native address {}", native.raw()),
        };
        let result = (entry.native)(frame);
        self.calls.push(NativeCall {
            name: entry.name.clone(),
            args: before,
            result,
        });
        result
    }

    fn log_print(&mut self, message: &str) {
        self.log.push(message.to_string());
    }
}
