//! Synthetic sender: logs every notification it consumes.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    channel::{ChannelComponent, ComponentContext, Deliver, Faults, Outlet, Properties, Sender},
    error::{ChannelError, PropertyError},
};

pub const KIND: &str = "dummy";

#[derive(Debug)]
pub struct DummySender {
    faults: Faults,
}

/// Builder registered under [`KIND`].
pub fn build(
    ctx: ComponentContext,
    props: &Properties,
) -> Result<Arc<dyn ChannelComponent>, PropertyError> {
    let inner = DummySender {
        faults: Faults::from_properties(props)?,
    };
    Ok(Sender::arc(ctx, inner))
}

#[async_trait]
impl Deliver for DummySender {
    async fn deliver(&self, input: Outlet, cancel: CancellationToken) -> Result<(), ChannelError> {
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
                n = input.recv() => match n {
                    Some(n) => tracing::info!(
                        title = n.title(),
                        severity = %n.severity(),
                        message = n.message(),
                        "notification sent"
                    ),
                    None => {
                        tracing::info!("input queue closed");
                        cancel.cancelled().await;
                        return Ok(());
                    }
                },
            }
        }
    }
}
