//! Routing of host-originated public calls to managed handlers.
//!
//! Each event name maps to an expected parameter format and, for array
//! parameters, the lengths to read. A call whose shape does not match its
//! entry is rejected before any handler runs.

use std::collections::HashMap;

use sampbridge_hostapi::{HostError, PublicCallFrame};
use sampbridge_primitives::types::{cell_to_bool, cell_to_float};
use sampbridge_primitives::{ParamCode, Value};
use serde::{Deserialize, Serialize};

use crate::codepage::Codepage;
use crate::error::BridgeError;
use crate::memory;

/// Handler for one public call. The returned code goes back to the host.
pub type PublicCallHandler<C> = Box<dyn FnMut(&mut C, &[Value]) -> anyhow::Result<i32>>;

/// What a routing context must provide.
pub trait RouteContext {
    /// Codepage used to decode string parameters.
    fn codepage(&self) -> &Codepage;
}

/// Expected shape of a public call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicCallEntry {
    pub name: String,
    /// Inbound transfer codes, one per parameter. `None` expects no parameters.
    #[serde(default)]
    pub format: Option<String>,
    /// Lengths of array parameters, consumed in order.
    #[serde(default)]
    pub counts: Option<Vec<usize>>,
}

impl PublicCallEntry {
    /// An entry with no parameters.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            format: None,
            counts: None,
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn with_counts(mut self, counts: Vec<usize>) -> Self {
        self.counts = Some(counts);
        self
    }

    pub fn param_count(&self) -> usize {
        self.format.as_deref().map_or(0, |f| f.chars().count())
    }
}

/// The entries every router starts with.
pub fn default_entries() -> Vec<PublicCallEntry> {
    vec![
        PublicCallEntry::new("OnGameModeInit"),
        PublicCallEntry::new("OnGameModeExit"),
        PublicCallEntry::new("OnRconCommand").with_format("s"),
    ]
}

/// Why a public call was not dispatched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("bridge is unloaded")]
    Unloaded,

    #[error("no public call named '{0}'")]
    Unregistered(String),

    #[error("no handler for '{0}'")]
    NoHandler(String),

    #[error("'{name}' expects {expected} parameters, got {got}")]
    ParamCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("'{name}' has {got} parameters (max {max})")]
    TooManyParams { name: String, got: usize, max: usize },

    #[error("'{name}' parameter {index}: frame holds only {len} cells")]
    MissingParam { name: String, index: usize, len: usize },

    #[error("'{name}' parameter {index}: no array length in counts")]
    MissingCount { name: String, index: usize },

    #[error("'{name}' parameter {index}: {source}")]
    BadArgument {
        name: String,
        index: usize,
        #[source]
        source: HostError,
    },
}

impl RejectReason {
    /// Rejections that point at a broken table or host frame, as opposed to
    /// events nobody subscribed to.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::TooManyParams { .. }
                | Self::MissingParam { .. }
                | Self::MissingCount { .. }
                | Self::BadArgument { .. }
        )
    }
}

/// Result of routing one public call.
#[derive(Debug)]
pub enum RouteOutcome {
    /// The handler ran and returned this code.
    Dispatched(i32),
    /// The call never reached a handler.
    Rejected(RejectReason),
    /// The handler returned an error.
    Failed { name: String, error: anyhow::Error },
}

struct Route<C> {
    entry: PublicCallEntry,
    codes: Vec<ParamCode>,
    handler: Option<PublicCallHandler<C>>,
}

/// Public call table plus handlers.
pub struct PublicCallRouter<C> {
    routes: HashMap<String, Route<C>>,
    max_params: usize,
}

impl<C> PublicCallRouter<C> {
    /// An empty table.
    pub fn new(max_params: usize) -> Self {
        Self {
            routes: HashMap::new(),
            max_params,
        }
    }

    /// A table holding [`default_entries`].
    pub fn with_default_entries(max_params: usize) -> Self {
        let mut router = Self::new(max_params);
        for entry in default_entries() {
            let name = entry.name.clone();
            if let Err(err) = router.define(entry) {
                log::error!("built-in public call {name} rejected: {err}");
            }
        }
        router
    }

    /// Add or replace a table entry. An existing handler is kept.
    pub fn define(&mut self, entry: PublicCallEntry) -> Result<(), BridgeError> {
        let codes = ParamCode::parse_all(entry.format.as_deref().unwrap_or(""))?;
        let handler = self.routes.remove(&entry.name).and_then(|r| r.handler);
        self.routes.insert(
            entry.name.clone(),
            Route {
                entry,
                codes,
                handler,
            },
        );
        Ok(())
    }

    /// Attach a handler to an existing entry.
    pub fn set_handler(&mut self, name: &str, handler: PublicCallHandler<C>) -> Result<(), BridgeError> {
        let route = self
            .routes
            .get_mut(name)
            .ok_or_else(|| BridgeError::UnknownPublicCall(name.to_string()))?;
        route.handler = Some(handler);
        Ok(())
    }

    /// Define an entry and attach its handler.
    pub fn register(&mut self, entry: PublicCallEntry, handler: PublicCallHandler<C>) -> Result<(), BridgeError> {
        let name = entry.name.clone();
        self.define(entry)?;
        self.set_handler(&name, handler)
    }

    /// Drop an entry and its handler.
    pub fn remove(&mut self, name: &str) -> bool {
        self.routes.remove(name).is_some()
    }

    pub fn entry(&self, name: &str) -> Option<&PublicCallEntry> {
        self.routes.get(name).map(|r| &r.entry)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Check the call shape and decode its parameters.
    pub fn prepare(
        &self,
        name: &str,
        param_count: usize,
        frame: &PublicCallFrame<'_>,
        codepage: &Codepage,
    ) -> Result<Vec<Value>, RejectReason> {
        let route = self
            .routes
            .get(name)
            .ok_or_else(|| RejectReason::Unregistered(name.to_string()))?;
        if param_count > self.max_params {
            return Err(RejectReason::TooManyParams {
                name: name.to_string(),
                got: param_count,
                max: self.max_params,
            });
        }
        if route.codes.len() != param_count {
            return Err(RejectReason::ParamCountMismatch {
                name: name.to_string(),
                expected: route.codes.len(),
                got: param_count,
            });
        }
        if route.handler.is_none() {
            return Err(RejectReason::NoHandler(name.to_string()));
        }
        decode_params(&route.entry, &route.codes, frame, codepage)
    }

    /// Validate, decode and dispatch one public call.
    pub fn route(
        &mut self,
        ctx: &mut C,
        name: &str,
        param_count: usize,
        frame: &PublicCallFrame<'_>,
    ) -> RouteOutcome
    where
        C: RouteContext,
    {
        let args = match self.prepare(name, param_count, frame, ctx.codepage()) {
            Ok(args) => args,
            Err(reason) => {
                if reason.is_fault() {
                    log::error!("public call rejected: {reason}");
                } else {
                    log::debug!("public call not handled: {reason}");
                }
                return RouteOutcome::Rejected(reason);
            }
        };
        let Some(handler) = self.routes.get_mut(name).and_then(|r| r.handler.as_mut()) else {
            return RouteOutcome::Rejected(RejectReason::NoHandler(name.to_string()));
        };
        match handler(ctx, &args) {
            Ok(code) => RouteOutcome::Dispatched(code),
            Err(error) => RouteOutcome::Failed {
                name: name.to_string(),
                error,
            },
        }
    }
}

fn decode_params(
    entry: &PublicCallEntry,
    codes: &[ParamCode],
    frame: &PublicCallFrame<'_>,
    codepage: &Codepage,
) -> Result<Vec<Value>, RejectReason> {
    let bad = |index: usize, source: HostError| RejectReason::BadArgument {
        name: entry.name.clone(),
        index,
        source,
    };
    let counts = entry.counts.as_deref().unwrap_or(&[]);
    let mut next_count = 0;
    let mut args = Vec::with_capacity(codes.len());

    for (index, &code) in codes.iter().enumerate() {
        let cell = *frame.params.get(index).ok_or_else(|| RejectReason::MissingParam {
            name: entry.name.clone(),
            index,
            len: frame.params.len(),
        })?;

        let value = match code {
            ParamCode::Int => Value::Int(cell),
            ParamCode::Float => Value::Float(cell_to_float(cell)),
            ParamCode::Bool => Value::Bool(cell_to_bool(cell)),
            ParamCode::Str => {
                let bytes = memory::read_string(frame.heap, cell).map_err(|e| bad(index, e))?;
                Value::Str(codepage.decode(&bytes))
            }
            ParamCode::IntArray | ParamCode::FloatArray | ParamCode::BoolArray => {
                let len = *counts.get(next_count).ok_or_else(|| RejectReason::MissingCount {
                    name: entry.name.clone(),
                    index,
                })?;
                next_count += 1;
                let cells = if len == 0 {
                    &[][..]
                } else {
                    memory::read_cells(frame.heap, cell, len).map_err(|e| bad(index, e))?
                };
                match code {
                    ParamCode::IntArray => Value::IntArray(cells.to_vec()),
                    ParamCode::FloatArray => {
                        Value::FloatArray(cells.iter().map(|&c| cell_to_float(c)).collect())
                    }
                    _ => Value::BoolArray(cells.iter().map(|&c| cell_to_bool(c)).collect()),
                }
            }
        };
        args.push(value);
    }
    Ok(args)
}
