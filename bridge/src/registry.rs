//! Native function resolution.
//!
//! Names are resolved against the host's native table once and cached for the
//! life of the registry. Handles are dense indices into the resolved-address
//! table, so turning a handle back into an address is a bounds check.

use std::collections::HashMap;

use sampbridge_hostapi::{NativeAddress, NativeHost};

use crate::error::BridgeError;

/// Opaque token for a resolved native.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(i32);

impl NativeHandle {
    pub const INVALID: NativeHandle = NativeHandle(-1);

    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

/// Name to handle cache over a host's native table.
#[derive(Debug, Default)]
pub struct NativeRegistry {
    addresses: Vec<NativeAddress>,
    names: Vec<String>,
    by_name: HashMap<String, NativeHandle>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name`, asking the host only on the first successful lookup.
    ///
    /// A failed lookup is not cached; the host may register the native later.
    pub fn resolve<H: NativeHost + ?Sized>(
        &mut self,
        host: &H,
        name: &str,
    ) -> Result<NativeHandle, BridgeError> {
        if let Some(&handle) = self.by_name.get(name) {
            return Ok(handle);
        }
        let address = host
            .find_native(name)
            .ok_or_else(|| BridgeError::UnknownNative(name.to_string()))?;

        let handle = NativeHandle(self.addresses.len() as i32);
        self.addresses.push(address);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), handle);
        log::debug!("resolved native {} -> handle {}", name, handle.raw());
        Ok(handle)
    }

    /// Cached handle for `name`, without asking the host.
    pub fn handle_of(&self, name: &str) -> Option<NativeHandle> {
        self.by_name.get(name).copied()
    }

    /// Host address behind `handle`.
    pub fn address(&self, handle: NativeHandle) -> Result<NativeAddress, BridgeError> {
        if !handle.is_valid() {
            return Err(BridgeError::InvalidHandle(handle.raw()));
        }
        self.addresses
            .get(handle.0 as usize)
            .copied()
            .ok_or(BridgeError::InvalidHandle(handle.raw()))
    }

    /// Name the handle was resolved from.
    pub fn name(&self, handle: NativeHandle) -> Option<&str> {
        if !handle.is_valid() {
            return None;
        }
        self.names.get(handle.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
