//! # Channel component contract and its two directional adapters.
//!
//! Every receiver and sender is a [`ChannelComponent`]. A concrete receiver only
//! has to implement [`Receive`] (it is handed the queue's [`Inlet`]); a concrete
//! sender implements [`Deliver`] (it is handed the [`Outlet`]). The thin
//! [`Receiver`] / [`Sender`] adapters lift them into the shared contract.
//!
//! ```text
//!   Receive ──► Receiver<R> ──┐
//!                             ├──► Arc<dyn ChannelComponent> ──► Supervisor
//!   Deliver ──► Sender<D>   ──┘
//! ```
//!
//! ## Contract for one attempt (`run`)
//! - push/pull notifications on the queue until `cancel` fires, then return `Ok(())`;
//! - return `Err(_)` on abnormal termination; the supervisor restarts after backoff;
//! - never ignore `cancel`: nothing forcibly stops a running attempt.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::{
    channel::{
        Role,
        queue::{Inlet, Outlet, Queue},
    },
    error::ChannelError,
};

/// Identity and logging context injected into a component at construction.
#[derive(Clone, Debug)]
pub struct ComponentContext {
    id: String,
    kind: String,
    role: Role,
    span: Span,
}

impl ComponentContext {
    /// Creates a context with a `component` span carrying `type`, `kind` and `id`.
    pub fn new(role: Role, kind: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        let kind = kind.into();
        let span = tracing::info_span!(
            "component",
            "type" = role.as_str(),
            kind = %kind,
            id = %id,
        );
        Self {
            id,
            kind,
            role,
            span,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// # Pluggable unit supervised by the runtime.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use notifier::{ChannelComponent, ChannelError, ComponentContext, Queue, Role};
///
/// struct Idle(ComponentContext);
///
/// #[async_trait]
/// impl ChannelComponent for Idle {
///     fn id(&self) -> &str { self.0.id() }
///     fn span(&self) -> &tracing::Span { self.0.span() }
///
///     async fn run(&self, _queue: Queue, cancel: CancellationToken) -> Result<(), ChannelError> {
///         cancel.cancelled().await;
///         Ok(())
///     }
/// }
///
/// let idle = Idle(ComponentContext::new(Role::Receiver, "idle", "r1"));
/// assert_eq!(idle.id(), "r1");
/// ```
#[async_trait]
pub trait ChannelComponent: Send + Sync + 'static {
    /// Stable identifier, for diagnostics only.
    fn id(&self) -> &str;

    /// Logging context (`type`, `kind`, `id`).
    fn span(&self) -> &Span;

    /// Body of one run attempt.
    ///
    /// The supervisor passes the same long-lived `queue` to every attempt.
    async fn run(&self, queue: Queue, cancel: CancellationToken) -> Result<(), ChannelError>;
}

/// Producing side of the contract: the component writes into the queue.
#[async_trait]
pub trait Receive: Send + Sync + 'static {
    async fn receive(&self, output: Inlet, cancel: CancellationToken) -> Result<(), ChannelError>;
}

/// Consuming side of the contract: the component reads from the queue.
#[async_trait]
pub trait Deliver: Send + Sync + 'static {
    async fn deliver(&self, input: Outlet, cancel: CancellationToken) -> Result<(), ChannelError>;
}

/// Adapter turning a [`Receive`] implementation into a [`ChannelComponent`].
pub struct Receiver<R> {
    ctx: ComponentContext,
    inner: R,
}

impl<R: Receive> Receiver<R> {
    pub fn new(ctx: ComponentContext, inner: R) -> Self {
        Self { ctx, inner }
    }

    /// Wraps and erases the type in one step (what builders return).
    pub fn arc(ctx: ComponentContext, inner: R) -> Arc<dyn ChannelComponent> {
        Arc::new(Self::new(ctx, inner))
    }
}

#[async_trait]
impl<R: Receive> ChannelComponent for Receiver<R> {
    fn id(&self) -> &str {
        self.ctx.id()
    }

    fn span(&self) -> &Span {
        self.ctx.span()
    }

    async fn run(&self, queue: Queue, cancel: CancellationToken) -> Result<(), ChannelError> {
        self.inner.receive(queue.inlet(), cancel).await
    }
}

/// Adapter turning a [`Deliver`] implementation into a [`ChannelComponent`].
pub struct Sender<D> {
    ctx: ComponentContext,
    inner: D,
}

impl<D: Deliver> Sender<D> {
    pub fn new(ctx: ComponentContext, inner: D) -> Self {
        Self { ctx, inner }
    }

    pub fn arc(ctx: ComponentContext, inner: D) -> Arc<dyn ChannelComponent> {
        Arc::new(Self::new(ctx, inner))
    }
}

#[async_trait]
impl<D: Deliver> ChannelComponent for Sender<D> {
    fn id(&self) -> &str {
        self.ctx.id()
    }

    fn span(&self) -> &Span {
        self.ctx.span()
    }

    async fn run(&self, queue: Queue, cancel: CancellationToken) -> Result<(), ChannelError> {
        self.inner.deliver(queue.outlet(), cancel).await
    }
}
