//! Restart policies.
//!
//! A supervised component is restarted after **every** abnormal stop, without
//! a retry budget. This module only decides **how long** to wait first.
//!
//! ## Contents
//! - [`BackoffPolicy`] how the delay evolves (first / factor / max);
//! - [`Jitter`] optional randomization of the delay.
//!
//! ## Quick wiring
//! ```text
//! RuntimeConfig { backoff: BackoffPolicy, .. }
//!      └─► core::supervisor loop:
//!           - backoff.next(consecutive_failures) before each restart
//!           - counter resets after a graceful attempt
//! ```

mod backoff;

pub use backoff::{BackoffPolicy, Jitter};
