//! Synthetic receiver: emits a fixed notification on a timer.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    channel::{ChannelComponent, ComponentContext, Faults, Inlet, Properties, Receive, Receiver},
    error::{ChannelError, PropertyError},
    notification::{Notification, Severity},
};

pub const KIND: &str = "dummy";

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Emits `{"Dummy Title", INFO, "Hello from <id>"}` every `intervalMs`.
#[derive(Debug)]
pub struct DummyReceiver {
    id: String,
    interval: Duration,
    faults: Faults,
}

/// Builder registered under [`KIND`].
pub fn build(
    ctx: ComponentContext,
    props: &Properties,
) -> Result<Arc<dyn ChannelComponent>, PropertyError> {
    let interval = props
        .optional_millis("intervalMs")?
        .unwrap_or(DEFAULT_INTERVAL);
    if interval.is_zero() {
        return Err(PropertyError::Invalid {
            key: "intervalMs".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let inner = DummyReceiver {
        id: ctx.id().to_string(),
        interval,
        faults: Faults::from_properties(props)?,
    };
    Ok(Receiver::arc(ctx, inner))
}

impl DummyReceiver {
    fn notification(&self) -> Notification {
        Notification::new("Dummy Title", Severity::Info, format!("Hello from {}", self.id))
    }
}

#[async_trait]
impl Receive for DummyReceiver {
    async fn receive(&self, output: Inlet, cancel: CancellationToken) -> Result<(), ChannelError> {
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let expired = self.faults.expired();
        tokio::pin!(expired);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.faults.linger().await;
                    return Ok(());
                }
                _ = &mut expired => {
                    self.faults.linger().await;
                    return Err(ChannelError::fail("timeout"));
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        res = output.push(self.notification()) => res?,
                        _ = cancel.cancelled() => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Queue, Role};

    fn component(props: Properties) -> Arc<dyn ChannelComponent> {
        build(ComponentContext::new(Role::Receiver, KIND, "tick"), &props).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn emits_hello_every_interval() {
        let queue = Queue::new(4);
        let cancel = CancellationToken::new();
        let dummy = component(Properties::new().with("intervalMs", 100));

        let run = tokio::spawn({
            let queue = queue.clone();
            let cancel = cancel.clone();
            async move { dummy.run(queue, cancel).await }
        });

        let outlet = queue.outlet();
        for _ in 0..2 {
            let n = outlet.recv().await.unwrap();
            assert_eq!(n.title(), "Dummy Title");
            assert_eq!(n.severity(), Severity::Info);
            assert_eq!(n.message(), "Hello from tick");
        }

        cancel.cancel();
        assert!(run.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn fails_with_timeout_after_fail_after() {
        let dummy = component(Properties::new().with("failAfterMs", 300));
        let start = time::Instant::now();

        let err = dummy
            .run(Queue::new(64), CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "execution failed: timeout");
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[test]
    fn rejects_zero_interval() {
        let Err(err) = build(
            ComponentContext::new(Role::Receiver, KIND, "tick"),
            &Properties::new().with("intervalMs", 0),
        ) else {
            panic!("zero interval accepted");
        };
        assert_eq!(err.as_label(), "property_invalid");
    }
}
