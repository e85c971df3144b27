//! # Run a single attempt of a channel component.
//!
//! [`launch`] spawns one `ChannelComponent::run` on its own task and returns an
//! [`Attempt`] immediately. The attempt resolves **at most once** with the outcome of
//! the run.
//!
//! ```text
//! launch(component, queue, cancel)
//!   └─► tokio::spawn(component.run(queue, cancel).instrument(span))
//!         │
//!         ▼
//!   Attempt::outcome()
//!     ├─► Ok(())                 graceful return
//!     ├─► Err(ChannelError)      abnormal return
//!     └─► Err(Panicked{info})    the run panicked
//! ```
//!
//! ## Rules
//! - A panic inside `run` never reaches the supervisory loop; it becomes
//!   [`ChannelError::Panicked`] and is retried like any other failure.
//! - The run is instrumented with the component's span, so every event it logs
//!   carries `type`, `kind` and `id`.

use std::{any::Any, sync::Arc};

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    channel::{ChannelComponent, Queue},
    error::ChannelError,
};

/// Handle on one in-flight run of a component.
pub(crate) struct Attempt {
    handle: JoinHandle<Result<(), ChannelError>>,
}

impl Attempt {
    /// Waits for the run to finish and maps task failures into [`ChannelError`].
    pub(crate) async fn outcome(self) -> Result<(), ChannelError> {
        match self.handle.await {
            Ok(res) => res,
            Err(err) => Err(join_failure(err)),
        }
    }
}

/// Starts one run of `component` and returns without waiting for it.
pub(crate) fn launch(
    component: &Arc<dyn ChannelComponent>,
    queue: Queue,
    cancel: CancellationToken,
) -> Attempt {
    let component = Arc::clone(component);
    let span = component.span().clone();
    let handle = tokio::spawn(async move { component.run(queue, cancel).await }.instrument(span));
    Attempt { handle }
}

fn join_failure(err: JoinError) -> ChannelError {
    if err.is_panic() {
        ChannelError::Panicked {
            info: panic_message(err.into_panic()),
        }
    } else {
        ChannelError::fail("attempt task was cancelled by the runtime")
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::channel::{ComponentContext, Role};

    struct Panicky(ComponentContext);

    #[async_trait]
    impl ChannelComponent for Panicky {
        fn id(&self) -> &str {
            self.0.id()
        }

        fn span(&self) -> &tracing::Span {
            self.0.span()
        }

        async fn run(&self, _queue: Queue, _cancel: CancellationToken) -> Result<(), ChannelError> {
            panic!("wires crossed");
        }
    }

    struct Quiet(ComponentContext);

    #[async_trait]
    impl ChannelComponent for Quiet {
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

    #[tokio::test]
    async fn panics_become_channel_errors() {
        let component: Arc<dyn ChannelComponent> =
            Arc::new(Panicky(ComponentContext::new(Role::Sender, "test", "p")));

        let err = launch(&component, Queue::new(1), CancellationToken::new())
            .outcome()
            .await
            .unwrap_err();

        match err {
            ChannelError::Panicked { info } => assert_eq!(info, "wires crossed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn launch_returns_before_the_run_finishes() {
        let component: Arc<dyn ChannelComponent> =
            Arc::new(Quiet(ComponentContext::new(Role::Receiver, "test", "q")));
        let cancel = CancellationToken::new();

        let attempt = launch(&component, Queue::new(1), cancel.clone());
        assert!(!attempt.handle.is_finished());

        cancel.cancel();
        assert!(attempt.outcome().await.is_ok());
    }
}
