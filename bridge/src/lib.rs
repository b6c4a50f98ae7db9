//! `sampbridge`: native call marshaling bridge between managed code and a
//! game server host.
//!
//! This crate sits between application code and a host that exports natives
//! and raises public calls (events). It provides:
//!
//! - **Native registry:** name to handle resolution, cached for the host's lifetime
//! - **Dispatcher:** marshals managed values into host cells, calls the native,
//!   and copies by-reference outputs back
//! - **Public call router:** validates event shapes and dispatches to handlers
//! - **Identified pools:** at most one live instance per host-assigned id
//! - **Codepages and timers:** string translation and tick-driven timers
//!
//! The primary entry point is [`Bridge`].

pub mod codepage;
pub mod config;
pub mod dispatch;
pub mod entities;
pub mod error;
pub mod error_log;
pub mod memory;
pub mod natives;
pub mod pool;
pub mod registry;
pub mod router;
pub mod runtime;
pub mod timers;

pub use codepage::Codepage;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use natives::BridgeNatives;
pub use pool::{Identified, IdentifiedPool};
pub use registry::{NativeHandle, NativeRegistry};
pub use router::{PublicCallEntry, PublicCallRouter, RejectReason, RouteOutcome};
pub use runtime::Bridge;
pub use timers::TimerId;
