//! # notifier
//!
//! **notifier** relays notifications from pluggable input sources ("receivers")
//! to pluggable output destinations ("senders"). Every component runs under a
//! supervisor that restarts it after failures, and the relay shuts down in a
//! fixed order so that nothing accepted by a receiver is dropped on a stopped
//! sender.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌────────────┐  ┌────────────┐
//!   │ Receiver A │  │ Receiver B │   (dummy, HTTP, ...)
//!   └─────┬──────┘  └─────┬──────┘
//!         ▼               ▼
//!   ┌────────────┐  ┌────────────┐
//!   │ Supervisor │  │ Supervisor │   restart loop + queue per component
//!   └─────┬──────┘  └─────┬──────┘
//!         │ forwarder     │ forwarder
//!         └──────┬────────┘
//!                ▼
//!       shared router input (mpsc)
//!                ▼
//!         ┌────────────┐
//!         │   Router   │   route(n): one delivery per sender, join all
//!         └──┬──────┬──┘
//!            ▼      ▼
//!   ┌────────────┐  ┌────────────┐
//!   │ Supervisor │  │ Supervisor │
//!   └─────┬──────┘  └─────┬──────┘
//!         ▼               ▼
//!   ┌────────────┐  ┌────────────┐
//!   │  Sender X  │  │  Sender Y  │   (dummy, webPush, ...)
//!   └────────────┘  └────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Config ──► Registry::build ──► Fleet ──► Orchestrator::start ──► Running
//!
//! start:     senders ─► receivers ─► forwarders ─► router
//! shutdown:  receivers (await) ─► drain router (bounded) ─► senders (await)
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                          |
//! |-----------------|----------------------------------------------------------|---------------------------------------------|
//! | **Components**  | Contract shared by receivers and senders.                | [`ChannelComponent`], [`Receive`], [`Deliver`] |
//! | **Supervision** | Auto-restart, idempotent start/shutdown handshake.       | [`Supervisor`], [`Completion`]              |
//! | **Registry**    | Kind → builder mapping, configuration → supervisors.     | [`Registry`], [`RegistryBuilder`]           |
//! | **Routing**     | Fan-out with an all-complete barrier.                    | [`Router`]                                  |
//! | **Relay**       | Wiring and ordered shutdown.                             | [`Orchestrator`], [`Running`]               |
//! | **Policies**    | Restart delay.                                           | [`BackoffPolicy`], [`Jitter`]               |
//! | **Events**      | Lifecycle event stream.                                  | [`Bus`], [`Event`], [`EventKind`]           |
//! | **Errors**      | Build-time and run-time failures.                        | [`BuildError`], [`ChannelError`], [`RuntimeError`] |
//!
//! ## Optional features
//! - `web-push` (default): the `webPush` sender kind.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use notifier::{Config, Orchestrator, Registry};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_yaml(
//!         r#"
//! receivers:
//!   - id: ticker
//!     kind: dummy
//!     properties: { intervalMs: 50 }
//! senders:
//!   - id: log
//!     kind: dummy
//! "#,
//!     )?;
//!
//!     let relay = Orchestrator::from_config(&Registry::standard(), &config)?;
//!     relay.run(tokio::time::sleep(Duration::from_millis(200))).await?;
//!     Ok(())
//! }
//! ```

mod channel;
mod config;
mod core;
mod error;
mod events;
mod notification;
mod policies;

pub mod receivers;
pub mod senders;

// ---- Public re-exports ----

pub use channel::{
    ChannelComponent, ComponentContext, Deliver, Inlet, Outlet, Properties, Queue, Receive,
    Receiver, Role, Sender,
};
pub use config::{ComponentConfig, Config, RuntimeConfig};
pub use core::{
    BuildFn, Completion, Fleet, Orchestrator, Registry, RegistryBuilder, Router, Running,
    ShutdownSignal, Supervisor, SupervisorParams,
};
pub use error::{BuildError, ChannelError, ConfigError, PropertyError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use notification::{Notification, Severity};
pub use policies::{BackoffPolicy, Jitter};
