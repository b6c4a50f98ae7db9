//! The native-calling context.
//!
//! `BridgeNatives` owns the host together with everything needed to call it:
//! the native registry, the active codepage, parsed call signatures and the
//! timer queue. Public call handlers and timer callbacks receive it by
//! `&mut`, so application code can call natives and arm timers from inside an
//! event.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use sampbridge_hostapi::NativeHost;
use sampbridge_primitives::{CallSignature, Value};

use crate::codepage::Codepage;
use crate::config::BridgeConfig;
use crate::dispatch::{self, DispatchContext};
use crate::error::BridgeError;
use crate::error_log::ErrorLog;
use crate::registry::{NativeHandle, NativeRegistry};
use crate::router::RouteContext;
use crate::timers::{TimerId, TimerQueue};

/// Host plus the state needed to marshal calls into it.
pub struct BridgeNatives<H> {
    host: H,
    registry: NativeRegistry,
    codepage: Codepage,
    codepage_dir: PathBuf,
    signatures: HashMap<(String, String), CallSignature>,
    timers: TimerQueue<BridgeNatives<H>>,
    now: Instant,
    max_native_args: usize,
    error_log: ErrorLog,
}

impl<H: NativeHost> BridgeNatives<H> {
    pub fn new(host: H, config: &BridgeConfig) -> Self {
        let mut natives = Self {
            host,
            registry: NativeRegistry::new(),
            codepage: Codepage::cp1252(),
            codepage_dir: config.codepage_dir.clone(),
            signatures: HashMap::new(),
            timers: TimerQueue::new(),
            now: Instant::now(),
            max_native_args: config.max_native_args,
            error_log: ErrorLog::new(config.error_log_path.clone()),
        };
        if let Some(name) = &config.codepage {
            if let Err(err) = natives.set_codepage(name) {
                log::warn!("{err}; using cp1252");
            }
        }
        natives
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &NativeRegistry {
        &self.registry
    }

    /// Write to the host's log.
    pub fn print(&mut self, message: &str) {
        self.host.log_print(message);
    }

    /// Switch string translation to `<codepage_dir>/<name>.txt`.
    ///
    /// On failure the active codepage is unchanged.
    pub fn set_codepage(&mut self, name: &str) -> Result<(), BridgeError> {
        self.codepage = Codepage::load(&self.codepage_dir, name)?;
        Ok(())
    }

    pub fn codepage(&self) -> &Codepage {
        &self.codepage
    }

    pub fn get_native(&mut self, name: &str) -> Result<NativeHandle, BridgeError> {
        self.registry.resolve(&self.host, name)
    }

    /// Call a resolved native with an already parsed signature.
    pub fn invoke(
        &mut self,
        handle: NativeHandle,
        signature: &CallSignature,
        args: &mut [Value],
        sizes: Option<&[i32]>,
    ) -> Result<i32, BridgeError> {
        let address = self.registry.address(handle)?;
        let ctx = DispatchContext {
            codepage: &self.codepage,
            max_args: self.max_native_args,
        };
        dispatch::invoke(&mut self.host, address, signature, args, sizes, ctx)
    }

    /// Call a resolved native, parsing its formats on first use.
    pub fn invoke_native(
        &mut self,
        handle: NativeHandle,
        native_format: &str,
        args_format: &str,
        args: &mut [Value],
        sizes: Option<&[i32]>,
    ) -> Result<i32, BridgeError> {
        let address = self.registry.address(handle)?;
        let key = (native_format.to_string(), args_format.to_string());
        let signature = match self.signatures.entry(key) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(CallSignature::parse(native_format, args_format)?),
        };
        let ctx = DispatchContext {
            codepage: &self.codepage,
            max_args: self.max_native_args,
        };
        dispatch::invoke(&mut self.host, address, signature, args, sizes, ctx)
    }

    /// Resolve `name` and call it.
    pub fn call(
        &mut self,
        name: &str,
        native_format: &str,
        args_format: &str,
        args: &mut [Value],
    ) -> Result<i32, BridgeError> {
        let handle = self.get_native(name)?;
        self.invoke_native(handle, native_format, args_format, args, None)
    }

    /// Arm a timer, due `interval_ms` after the last tick.
    pub fn set_timer<F>(&mut self, interval_ms: u32, repeat: bool, callback: F) -> TimerId
    where
        F: FnMut(&mut Self) -> anyhow::Result<()> + 'static,
    {
        self.timers.set(interval_ms, repeat, self.now, Box::new(callback))
    }

    pub fn kill_timer(&mut self, id: TimerId) -> bool {
        self.timers.kill(id)
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Run the timers due at `now`.
    pub fn tick(&mut self, now: Instant) {
        self.now = now;
        for id in self.timers.due(now) {
            let Some(mut callback) = self.timers.begin(id) else {
                continue;
            };
            let result = callback(self);
            self.timers.finish(id, callback, now);
            if let Err(err) = result {
                self.report_unhandled(&format!("timer {id}"), &err);
            }
        }
    }

    /// Log an application error and append it to the error log.
    pub fn report_unhandled(&mut self, origin: &str, error: &anyhow::Error) {
        log::error!("unhandled error in {origin}: {error:#}");
        if let Err(err) = self.error_log.append(error) {
            log::warn!("cannot write error log: {err}");
        }
    }
}

impl<H> RouteContext for BridgeNatives<H> {
    fn codepage(&self) -> &Codepage {
        &self.codepage
    }
}
