//! # Restart backoff for supervised components.
//!
//! [`BackoffPolicy`] decides how long a supervisor sleeps before restarting a
//! component whose attempt ended with an error. The delay for the `n`-th
//! consecutive failure (0-indexed) is `first × factor^n`, clamped to `max`,
//! then [`Jitter`] is applied. The base is derived from the failure count only,
//! so jitter never feeds back into later delays.
//!
//! The default is a **fixed 1 second** with no jitter and no retry limit.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use notifier::{BackoffPolicy, Jitter};
//!
//! let fixed = BackoffPolicy::default();
//! assert_eq!(fixed.next(0), Duration::from_secs(1));
//! assert_eq!(fixed.next(50), Duration::from_secs(1));
//!
//! let growing = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(2),
//!     factor: 2.0,
//!     jitter: Jitter::None,
//! };
//! assert_eq!(growing.next(1), Duration::from_millis(200));
//! assert_eq!(growing.next(10), Duration::from_secs(2));
//! ```

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Randomization applied on top of the computed delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jitter {
    /// Exact delay.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// `delay/2 + uniform[0, delay/2]`.
    Equal,
}

impl Jitter {
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis().min(u128::from(u64::MAX)) as u64;
        if ms == 0 {
            return delay;
        }
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            Jitter::Equal => {
                let half = ms / 2;
                let extra = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + extra)
            }
        }
    }
}

/// Restart delay policy.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    #[serde(rename = "firstMs", with = "crate::config::millis")]
    pub first: Duration,
    /// Upper bound for any delay.
    #[serde(rename = "maxMs", with = "crate::config::millis")]
    pub max: Duration,
    /// Multiplicative growth per consecutive failure (`1.0` = constant).
    pub factor: f64,
    pub jitter: Jitter,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

impl BackoffPolicy {
    /// Constant delay, no jitter.
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: Jitter::None,
        }
    }

    /// Delay before restarting after `failures` previous consecutive failures.
    pub fn next(&self, failures: u32) -> Duration {
        let exp = failures.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
