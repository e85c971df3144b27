//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (component events), `Running::shutdown`
//!   (relay phases).
//! - **Consumers**: whoever calls [`Bus::subscribe`]; the runtime itself never
//!   depends on events being observed. Logging goes through `tracing` directly.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
