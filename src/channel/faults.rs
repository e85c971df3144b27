//! Simulated failure and teardown latency for the synthetic `dummy` kinds.
//!
//! - `failAfterMs`: the attempt fails with `"timeout"` after this long;
//! - `shutdownDelayMs`: how long the component lingers after cancellation.

use std::time::Duration;

use tokio::time;

use crate::{channel::Properties, error::PropertyError};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Faults {
    fail_after: Option<Duration>,
    shutdown_delay: Duration,
}

impl Faults {
    pub(crate) fn from_properties(props: &Properties) -> Result<Self, PropertyError> {
        Ok(Self {
            fail_after: props.optional_millis("failAfterMs")?,
            shutdown_delay: props.optional_millis("shutdownDelayMs")?.unwrap_or_default(),
        })
    }

    /// Resolves when the attempt should fail; never resolves without `failAfterMs`.
    pub(crate) async fn expired(&self) {
        match self.fail_after {
            Some(after) => time::sleep(after).await,
            None => std::future::pending().await,
        }
    }

    /// Simulated teardown after cancellation.
    pub(crate) async fn linger(&self) {
        if !self.shutdown_delay.is_zero() {
            time::sleep(self.shutdown_delay).await;
        }
    }
}
