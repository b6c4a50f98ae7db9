//! Bridge runtime: the entry point the host plugin drives.
//!
//! `Bridge` owns the native context and the public call router. The host
//! forwards its ticks and public calls here; everything else is exposed to
//! application code through [`BridgeNatives`].

use std::time::Instant;

use sampbridge_hostapi::{NativeHost, PublicCallFrame};
use sampbridge_primitives::Value;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::natives::BridgeNatives;
use crate::registry::NativeHandle;
use crate::router::{PublicCallEntry, PublicCallRouter, RejectReason, RouteOutcome};
use crate::timers::TimerId;

/// The managed side of a host plugin.
pub struct Bridge<H> {
    natives: BridgeNatives<H>,
    router: PublicCallRouter<BridgeNatives<H>>,
    not_handled_code: i32,
    loaded: bool,
}

impl<H: NativeHost> Bridge<H> {
    /// Build a bridge over `host`.
    ///
    /// The router starts with the built-in hooks plus `config.public_calls`;
    /// entries with a malformed format are skipped with an error log.
    pub fn new(host: H, config: BridgeConfig) -> Self {
        let natives = BridgeNatives::new(host, &config);
        let mut router = PublicCallRouter::with_default_entries(config.max_callback_params);
        for entry in config.public_calls {
            let name = entry.name.clone();
            if let Err(err) = router.define(entry) {
                log::error!("skipping public call {name}: {err}");
            }
        }
        log::info!(
            "bridge loaded ({} public calls, codepage {})",
            router.len(),
            natives.codepage().name()
        );
        Self {
            natives,
            router,
            not_handled_code: config.not_handled_code,
            loaded: true,
        }
    }

    pub fn natives(&self) -> &BridgeNatives<H> {
        &self.natives
    }

    pub fn natives_mut(&mut self) -> &mut BridgeNatives<H> {
        &mut self.natives
    }

    pub fn host(&self) -> &H {
        self.natives.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.natives.host_mut()
    }

    pub fn router(&self) -> &PublicCallRouter<BridgeNatives<H>> {
        &self.router
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Stop routing public calls and ticks.
    pub fn unload(&mut self) {
        if self.loaded {
            self.loaded = false;
            log::info!("bridge unloaded");
        }
    }

    pub fn print(&mut self, message: &str) {
        self.natives.print(message);
    }

    pub fn set_codepage(&mut self, name: &str) -> Result<(), BridgeError> {
        self.natives.set_codepage(name)
    }

    pub fn get_native(&mut self, name: &str) -> Result<NativeHandle, BridgeError> {
        self.natives.get_native(name)
    }

    pub fn invoke_native(
        &mut self,
        handle: NativeHandle,
        native_format: &str,
        args_format: &str,
        args: &mut [Value],
        sizes: Option<&[i32]>,
    ) -> Result<i32, BridgeError> {
        self.natives
            .invoke_native(handle, native_format, args_format, args, sizes)
    }

    pub fn set_timer<F>(&mut self, interval_ms: u32, repeat: bool, callback: F) -> TimerId
    where
        F: FnMut(&mut BridgeNatives<H>) -> anyhow::Result<()> + 'static,
    {
        self.natives.set_timer(interval_ms, repeat, callback)
    }

    pub fn kill_timer(&mut self, id: TimerId) -> bool {
        self.natives.kill_timer(id)
    }

    /// Host tick: run due timers.
    pub fn tick(&mut self, now: Instant) {
        if self.loaded {
            self.natives.tick(now);
        }
    }

    /// Define a public call and attach its handler.
    pub fn register_public_call<F>(&mut self, entry: PublicCallEntry, handler: F) -> Result<(), BridgeError>
    where
        F: FnMut(&mut BridgeNatives<H>, &[Value]) -> anyhow::Result<i32> + 'static,
    {
        self.router.register(entry, Box::new(handler))
    }

    /// Attach a handler to an already defined public call.
    pub fn on<F>(&mut self, name: &str, handler: F) -> Result<(), BridgeError>
    where
        F: FnMut(&mut BridgeNatives<H>, &[Value]) -> anyhow::Result<i32> + 'static,
    {
        self.router.set_handler(name, Box::new(handler))
    }

    /// Route a public call and report exactly what happened.
    ///
    /// Handler failures are logged and written to the error log here.
    pub fn route(&mut self, name: &str, param_count: usize, frame: &PublicCallFrame<'_>) -> RouteOutcome {
        if !self.loaded {
            return RouteOutcome::Rejected(RejectReason::Unloaded);
        }
        let outcome = self.router.route(&mut self.natives, name, param_count, frame);
        if let RouteOutcome::Failed { name, error } = &outcome {
            self.natives.report_unhandled(name, error);
        }
        outcome
    }

    /// Host entry point for public calls. Returns the handler's code, or the
    /// not-handled code if the call was rejected or its handler failed.
    pub fn on_public_call(&mut self, name: &str, param_count: usize, frame: &PublicCallFrame<'_>) -> i32 {
        match self.route(name, param_count, frame) {
            RouteOutcome::Dispatched(code) => code,
            RouteOutcome::Rejected(_) | RouteOutcome::Failed { .. } => self.not_handled_code,
        }
    }
}
