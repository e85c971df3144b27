//! # Router: fan-out of one notification to every sender.
//!
//! ```text
//!  router input (mpsc) ──► Router::spawn task ──► route(n)
//!                                                  ├─► delivery → sender 1 inlet
//!                                                  ├─► delivery → sender 2 inlet
//!                                                  └─► delivery → sender k inlet
//!                                                  ▼
//!                                        join all (barrier), next n
//! ```
//!
//! ## Rules
//! - Input is consumed serially, so notifications are broadcast in arrival order.
//! - Deliveries for one notification run concurrently; `route` returns only
//!   after every one of them finished.
//! - No per-sender timeout: a full sender queue stalls the broadcast (backpressure).
//! - A sender that is not running is skipped; a queue closed mid-delivery is
//!   logged and dropped.

use std::sync::Arc;

use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
};
use tracing::Instrument;

use crate::{core::supervisor::Supervisor, notification::Notification};

/// Broadcasts notifications to a fixed set of sender supervisors.
#[derive(Clone)]
pub struct Router {
    senders: Arc<[Arc<Supervisor>]>,
}

impl Router {
    pub fn new(senders: Vec<Arc<Supervisor>>) -> Self {
        Self {
            senders: senders.into(),
        }
    }

    /// Writes `n` into every running sender's queue and waits for all writes.
    pub async fn route(&self, n: Arc<Notification>) {
        let mut deliveries = JoinSet::new();

        for sender in self.senders.iter() {
            let Some(inlet) = sender.inlet() else {
                tracing::debug!(sender = sender.id(), "sender not running; skipped");
                continue;
            };
            let sender = Arc::clone(sender);
            let n = Arc::clone(&n);
            deliveries.spawn(async move {
                if let Err(err) = inlet.send(n).await {
                    tracing::warn!(sender = sender.id(), error = %err, "notification dropped");
                }
            });
        }

        while let Some(res) = deliveries.join_next().await {
            if let Err(err) = res {
                tracing::warn!(error = %err, "delivery task failed");
            }
        }
    }

    /// Runs the router task until `input` is closed and drained.
    ///
    /// The task returns the number of notifications routed.
    pub fn spawn(self, mut input: mpsc::Receiver<Arc<Notification>>) -> JoinHandle<u64> {
        tokio::spawn(
            async move {
                let mut routed: u64 = 0;
                while let Some(n) = input.recv().await {
                    tracing::trace!(title = n.title(), "routing");
                    self.route(n).await;
                    routed += 1;
                }
                tracing::debug!(routed, "router input closed");
                routed
            }
            .instrument(tracing::info_span!("router")),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{
        channel::{ChannelComponent, ComponentContext, Queue, Role},
        core::supervisor::SupervisorParams,
        error::ChannelError,
        events::Bus,
        notification::Severity,
    };

    /// Never reads its queue, so routed notifications stay buffered.
    struct Parked(ComponentContext);

    #[async_trait]
    impl ChannelComponent for Parked {
        fn id(&self) -> &str {
            self.0.id()
        }

        fn span(&self) -> &tracing::Span {
            self.0.span()
        }

        async fn run(&self, _queue: Queue, cancel: CancellationToken) -> Result<(), ChannelError> {
            cancel.cancelled().await;
            Ok(())
        }
    }

    fn sender(id: &str, capacity: usize) -> Arc<Supervisor> {
        Arc::new(Supervisor::new(
            Role::Sender,
            Arc::new(Parked(ComponentContext::new(Role::Sender, "parked", id))),
            SupervisorParams {
                queue_capacity: capacity,
                ..Default::default()
            },
            Bus::default(),
        ))
    }

    fn note(message: &str) -> Arc<Notification> {
        Arc::new(Notification::new("t", Severity::Warn, message))
    }

    #[tokio::test]
    async fn every_sender_holds_the_notification_when_route_returns() {
        let senders: Vec<_> = (0..3).map(|i| sender(&format!("s{i}"), 1)).collect();
        let done: Vec<_> = senders.iter().filter_map(|s| s.start()).collect();
        let outlets: Vec<_> = senders.iter().map(|s| s.outlet().unwrap()).collect();

        let n = note("fan-out");
        Router::new(senders.clone()).route(Arc::clone(&n)).await;

        for outlet in &outlets {
            let got = time::timeout(Duration::from_millis(10), outlet.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(Arc::ptr_eq(&got, &n));
        }

        senders.iter().for_each(|s| s.shutdown());
        futures::future::join_all(done).await;
    }

    #[tokio::test]
    async fn route_without_senders_returns_immediately() {
        time::timeout(Duration::from_millis(50), Router::new(vec![]).route(note("x")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stopped_senders_are_skipped() {
        let idle = sender("idle", 1);
        time::timeout(Duration::from_millis(50), Router::new(vec![idle]).route(note("x")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn router_task_preserves_order_and_counts() {
        let s = sender("s", 8);
        let done = s.start().unwrap();
        let outlet = s.outlet().unwrap();

        let (tx, rx) = mpsc::channel(4);
        let task = Router::new(vec![Arc::clone(&s)]).spawn(rx);
        for m in ["a", "b", "c"] {
            tx.send(note(m)).await.unwrap();
        }
        drop(tx);

        assert_eq!(task.await.unwrap(), 3);
        for m in ["a", "b", "c"] {
            assert_eq!(outlet.recv().await.unwrap().message(), m);
        }

        s.shutdown();
        done.await;
    }
}
