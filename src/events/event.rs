//! # Lifecycle events emitted by supervisors and the orchestrator.
//!
//! The [`EventKind`] enum classifies event types in two groups:
//! - **Component events**: one supervised component (starting, failed, backoff...)
//! - **Relay events**: the phases of the orchestrator's shutdown sequence
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use notifier::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_component("inbox")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(1));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.component.as_deref(), Some("inbox"));
//! assert_eq!(ev.delay_ms, Some(1000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::channel::Role;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Component events ===
    /// An attempt is about to run.
    ///
    /// Sets: `component`, `role`, `attempt` (1-based, per start).
    ComponentStarting,

    /// An attempt returned gracefully.
    ///
    /// Sets: `component`, `role`, `attempt`.
    ComponentStopped,

    /// An attempt returned an error (or panicked).
    ///
    /// Sets: `component`, `role`, `attempt`, `reason`.
    ComponentFailed,

    /// A restart is scheduled after a failure.
    ///
    /// Sets: `component`, `role`, `attempt` (the failed one), `delay_ms`.
    BackoffScheduled,

    /// `Supervisor::shutdown` fired the cancellation signal.
    ///
    /// Sets: `component`, `role`.
    ComponentShutdownRequested,

    /// Teardown finished: queue closed, completion signal fired.
    ///
    /// Sets: `component`, `role`.
    ComponentTerminated,

    // === Relay events ===
    /// The orchestrator started its shutdown sequence.
    ShutdownRequested,

    /// Every receiver reported completion.
    ReceiversStopped,

    /// Forwarders and the router task finished; nothing is in flight.
    RouterDrained,

    /// The drain barrier timed out; in-flight deliveries were aborted.
    ///
    /// Sets: `delay_ms` (the grace that was exceeded).
    DrainExceeded,

    /// Every sender reported completion.
    SendersStopped,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    pub kind: EventKind,

    /// Component id, if applicable.
    pub component: Option<Arc<str>>,
    pub role: Option<Role>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Delay in milliseconds (backoff or grace).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (error text).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: None,
            role: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_component(mut self, id: impl Into<Arc<str>>) -> Self {
        self.component = Some(id.into());
        self
    }

    #[inline]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns true for events about one component (as opposed to relay phases).
    pub fn is_component_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ComponentStarting
                | EventKind::ComponentStopped
                | EventKind::ComponentFailed
                | EventKind::BackoffScheduled
                | EventKind::ComponentShutdownRequested
                | EventKind::ComponentTerminated
        )
    }
}
