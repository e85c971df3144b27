//! # Communication queue owned by a supervisor.
//!
//! One bounded `mpsc` channel of `Arc<Notification>`, split in two halves:
//!
//! ```text
//!   Inlet (cloneable send half) ──► [ bounded buffer ] ──► Outlet (shared receive half)
//!
//!   receiver supervisor:  component writes Inlet,   forwarder reads Outlet
//!   sender supervisor:    router writes Inlet,      component reads Outlet
//! ```
//!
//! ## Rules
//! - The queue closes once **every** `Inlet` is dropped; `Outlet::recv` then
//!   drains the remaining items and returns `None`.
//! - The `Outlet` sits behind an async mutex so that successive attempts of a
//!   restarted component keep reading the same queue.
//! - A full buffer makes `Inlet::send` wait (backpressure, never loss).

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::{error::ChannelError, notification::Notification};

/// Both halves of a communication queue.
#[derive(Clone, Debug)]
pub struct Queue {
    inlet: Inlet,
    outlet: Outlet,
}

impl Queue {
    /// Creates a queue with the given capacity (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            inlet: Inlet { tx },
            outlet: Outlet {
                rx: Arc::new(Mutex::new(rx)),
            },
        }
    }

    pub fn inlet(&self) -> Inlet {
        self.inlet.clone()
    }

    pub fn outlet(&self) -> Outlet {
        self.outlet.clone()
    }
}

/// Writing half of a [`Queue`].
#[derive(Clone, Debug)]
pub struct Inlet {
    tx: mpsc::Sender<Arc<Notification>>,
}

impl Inlet {
    /// Waits for buffer space and enqueues a shared notification.
    pub async fn send(&self, n: Arc<Notification>) -> Result<(), ChannelError> {
        self.tx.send(n).await.map_err(|_| ChannelError::Closed)
    }

    /// Convenience for producers holding an owned value.
    pub async fn push(&self, n: Notification) -> Result<(), ChannelError> {
        self.send(Arc::new(n)).await
    }

    /// True once the reading side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Reading half of a [`Queue`].
#[derive(Clone, Debug)]
pub struct Outlet {
    rx: Arc<Mutex<mpsc::Receiver<Arc<Notification>>>>,
}

impl Outlet {
    /// Receives the next notification, or `None` once the queue is closed and empty.
    ///
    /// Cancel-safe: dropping the future never loses an item.
    pub async fn recv(&self) -> Option<Arc<Notification>> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Severity;

    #[tokio::test]
    async fn closes_when_every_inlet_is_dropped() {
        let queue = Queue::new(4);
        let outlet = queue.outlet();
        let inlet = queue.inlet();

        inlet
            .push(Notification::new("t", Severity::Info, "one"))
            .await
            .unwrap();
        drop(inlet);
        drop(queue);

        let first = outlet.recv().await.unwrap();
        assert_eq!(first.message(), "one");
        assert!(outlet.recv().await.is_none());
    }

    #[tokio::test]
    async fn outlet_clones_share_one_buffer() {
        let queue = Queue::new(2);
        let a = queue.outlet();
        let b = queue.outlet();

        queue
            .inlet()
            .push(Notification::new("t", Severity::Info, "x"))
            .await
            .unwrap();
        queue
            .inlet()
            .push(Notification::new("t", Severity::Info, "y"))
            .await
            .unwrap();

        assert_eq!(a.recv().await.unwrap().message(), "x");
        assert_eq!(b.recv().await.unwrap().message(), "y");
    }
}
