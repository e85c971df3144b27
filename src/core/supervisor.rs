//! # Supervisor: keeps one channel component running.
//!
//! A [`Supervisor`] owns one [`ChannelComponent`], its communication [`Queue`]
//! and the cancellation signal of the current lifetime. It restarts the component
//! after every abnormal stop and exposes an idempotent start/shutdown handshake.
//!
//! ## States
//! ```text
//! Idle ──start()──► Running ──error──► Backoff ──sleep──► Running
//!                     │                   │
//!                  shutdown()          shutdown()
//!                     ▼                   ▼
//!                 ShuttingDown ──────► teardown ──► Idle (queue closed, completion fired)
//! ```
//!
//! ## Supervisory loop
//! ```text
//! loop {
//!   ├─► publish ComponentStarting
//!   ├─► launch(component, queue, cancel) ──► Attempt
//!   ├─► Attempt::outcome()
//!   │     ├─► Ok  → reset failures; shutting down? teardown : restart now
//!   │     └─► Err → log; shutting down? teardown : sleep(backoff) → re-check
//! }
//! ```
//!
//! ## Rules
//! - The lock only guards `{started, shutting_down, cancel, queue}` and is never
//!   held across an `.await`.
//! - `shutting_down` is only ever true while `started` is true.
//! - The queue is created once per [`Supervisor::start`] and shared by every
//!   attempt of that lifetime; teardown drops it, which closes it.
//! - The backoff sleep is interrupted by [`Supervisor::shutdown`].

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};

use tokio::{select, sync::oneshot, time};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::{
    channel::{ChannelComponent, Inlet, Outlet, Queue, Role},
    config::RuntimeConfig,
    core::runner,
    events::{Bus, Event, EventKind},
    policies::BackoffPolicy,
};

/// Parameters shared by every supervisor of a fleet.
#[derive(Clone, Debug, Default)]
pub struct SupervisorParams {
    /// Capacity of the communication queue (min 1).
    pub queue_capacity: usize,
    /// Restart delay after an abnormal stop.
    pub backoff: BackoffPolicy,
}

impl From<&RuntimeConfig> for SupervisorParams {
    fn from(runtime: &RuntimeConfig) -> Self {
        Self {
            queue_capacity: runtime.queue_capacity_clamped(),
            backoff: runtime.backoff,
        }
    }
}

/// Resolves exactly once, when the supervisor finished its teardown.
#[must_use = "a completion does nothing unless awaited"]
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<()>,
}

impl Future for Completion {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // A dropped sender also means the loop is gone.
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}

#[derive(Default)]
struct State {
    started: bool,
    shutting_down: bool,
    cancel: CancellationToken,
    queue: Option<Queue>,
}

/// Lifecycle wrapper around one channel component.
pub struct Supervisor {
    role: Role,
    component: Arc<dyn ChannelComponent>,
    params: SupervisorParams,
    bus: Bus,
    state: Mutex<State>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("id", &self.id())
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(
        role: Role,
        component: Arc<dyn ChannelComponent>,
        params: SupervisorParams,
        bus: Bus,
    ) -> Self {
        Self {
            role,
            component,
            params,
            bus,
            state: Mutex::new(State::default()),
        }
    }

    pub fn id(&self) -> &str {
        self.component.id()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn span(&self) -> &Span {
        self.component.span()
    }

    /// True between a successful [`start`](Self::start) and the end of teardown.
    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    /// Writing half of the current queue, or `None` when not started.
    pub fn inlet(&self) -> Option<Inlet> {
        self.lock().queue.as_ref().map(Queue::inlet)
    }

    /// Reading half of the current queue, or `None` when not started.
    pub fn outlet(&self) -> Option<Outlet> {
        self.lock().queue.as_ref().map(Queue::outlet)
    }

    /// Starts the supervisory loop.
    ///
    /// Returns `None` without doing anything if the supervisor is already started;
    /// otherwise the returned [`Completion`] resolves once teardown is finished.
    /// Must be called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>) -> Option<Completion> {
        let (queue, cancel) = {
            let mut state = self.lock();
            tracing::debug!(parent: self.span(), "start invoked");
            if state.started {
                tracing::debug!(parent: self.span(), "already started");
                return None;
            }
            let queue = Queue::new(self.params.queue_capacity);
            let cancel = CancellationToken::new();
            state.started = true;
            state.shutting_down = false;
            state.queue = Some(queue.clone());
            state.cancel = cancel.clone();
            (queue, cancel)
        };

        let (done_tx, done_rx) = oneshot::channel();
        let this = Arc::clone(self);
        let span = self.span().clone();
        tokio::spawn(
            async move { this.supervise(queue, cancel, done_tx).await }.instrument(span),
        );
        Some(Completion { rx: done_rx })
    }

    /// Requests a graceful stop. No-op when not started or already shutting down.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        tracing::debug!(parent: self.span(), "shutdown invoked");
        if !state.started {
            tracing::debug!(parent: self.span(), "not started");
            return;
        }
        if state.shutting_down {
            return;
        }
        tracing::info!(parent: self.span(), "shutting down");
        state.shutting_down = true;
        state.cancel.cancel();
        self.bus.publish(self.event(EventKind::ComponentShutdownRequested));
    }

    async fn supervise(
        self: Arc<Self>,
        queue: Queue,
        cancel: CancellationToken,
        done: oneshot::Sender<()>,
    ) {
        let mut attempt: u32 = 0;
        let mut failures: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            tracing::info!(attempt, "starting");
            self.bus
                .publish(self.event(EventKind::ComponentStarting).with_attempt(attempt));

            let res = runner::launch(&self.component, queue.clone(), cancel.clone())
                .outcome()
                .await;

            match res {
                Ok(()) => {
                    failures = 0;
                    self.bus
                        .publish(self.event(EventKind::ComponentStopped).with_attempt(attempt));
                    if self.is_shutting_down() {
                        break;
                    }
                    tracing::info!(attempt, "stopped without shutdown request; restarting");
                }
                Err(err) => {
                    tracing::error!(
                        attempt,
                        error = %err,
                        label = err.as_label(),
                        "error in channel component"
                    );
                    self.bus.publish(
                        self.event(EventKind::ComponentFailed)
                            .with_attempt(attempt)
                            .with_reason(err.to_string()),
                    );
                    if self.is_shutting_down() {
                        break;
                    }

                    let delay = self.params.backoff.next(failures);
                    failures = failures.saturating_add(1);
                    tracing::info!(delay_ms = delay.as_millis() as u64, "restart after {delay:?}");
                    self.bus.publish(
                        self.event(EventKind::BackoffScheduled)
                            .with_attempt(attempt)
                            .with_delay(delay),
                    );

                    select! {
                        _ = time::sleep(delay) => {}
                        _ = cancel.cancelled() => {}
                    }
                    if self.is_shutting_down() {
                        break;
                    }
                }
            }
        }

        self.teardown(queue, done);
    }

    fn teardown(&self, queue: Queue, done: oneshot::Sender<()>) {
        {
            let mut state = self.lock();
            state.started = false;
            state.shutting_down = false;
            state.queue = None;
        }
        drop(queue);

        tracing::info!("terminated");
        self.bus.publish(self.event(EventKind::ComponentTerminated));
        let _ = done.send(());
    }

    fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_component(self.id())
            .with_role(self.role)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::{
        channel::ComponentContext,
        error::ChannelError,
        notification::{Notification, Severity},
    };

    /// Fails the first `fail_first` runs, then idles until cancelled.
    struct Flaky {
        ctx: ComponentContext,
        fail_first: u32,
        runs: AtomicU32,
        seen: Mutex<Vec<(Instant, String)>>,
    }

    impl Flaky {
        fn new(id: &str, fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                ctx: ComponentContext::new(Role::Receiver, "flaky", id),
                fail_first,
                runs: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn runs(&self) -> u32 {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChannelComponent for Flaky {
        fn id(&self) -> &str {
            self.ctx.id()
        }

        fn span(&self) -> &Span {
            self.ctx.span()
        }

        async fn run(&self, _queue: Queue, cancel: CancellationToken) -> Result<(), ChannelError> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((Instant::now(), self.id().to_string()));
            if run < self.fail_first {
                return Err(ChannelError::fail("timeout"));
            }
            cancel.cancelled().await;
            Ok(())
        }
    }

    #[derive(Clone, Copy)]
    enum Step {
        /// Returns `Ok(())` right away.
        Return,
        /// Returns an error right away.
        Fail,
        /// Waits for cancellation, then returns an error.
        FailOnCancel,
    }

    /// Plays `steps` one per run, then idles until cancelled.
    struct Scripted {
        ctx: ComponentContext,
        steps: Vec<Step>,
        runs: AtomicU32,
        started_at: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                ctx: ComponentContext::new(Role::Sender, "scripted", "s1"),
                steps,
                runs: AtomicU32::new(0),
                started_at: Mutex::new(Vec::new()),
            })
        }

        fn runs(&self) -> u32 {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChannelComponent for Scripted {
        fn id(&self) -> &str {
            self.ctx.id()
        }

        fn span(&self) -> &Span {
            self.ctx.span()
        }

        async fn run(&self, _queue: Queue, cancel: CancellationToken) -> Result<(), ChannelError> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst) as usize;
            self.started_at.lock().unwrap().push(Instant::now());
            match self.steps.get(run) {
                Some(Step::Return) => Ok(()),
                Some(Step::Fail) => Err(ChannelError::fail("boom")),
                Some(Step::FailOnCancel) => {
                    cancel.cancelled().await;
                    Err(ChannelError::fail("teardown error"))
                }
                None => {
                    cancel.cancelled().await;
                    Ok(())
                }
            }
        }
    }

    fn supervise(component: Arc<dyn ChannelComponent>) -> Arc<Supervisor> {
        supervise_with(component, BackoffPolicy::default())
    }

    fn supervise_with(
        component: Arc<dyn ChannelComponent>,
        backoff: BackoffPolicy,
    ) -> Arc<Supervisor> {
        Arc::new(Supervisor::new(
            Role::Receiver,
            component,
            SupervisorParams {
                queue_capacity: 1,
                backoff,
            },
            Bus::default(),
        ))
    }

    fn drain_kinds(events: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_starts_launch_one_loop() {
        for _ in 0..16 {
            let flaky = Flaky::new("r1", 0);
            let sup = supervise(Arc::clone(&flaky) as Arc<dyn ChannelComponent>);
            let barrier = Arc::new(std::sync::Barrier::new(2));

            let racers: Vec<_> = (0..2)
                .map(|_| {
                    let (sup, barrier) = (Arc::clone(&sup), Arc::clone(&barrier));
                    tokio::task::spawn_blocking(move || {
                        barrier.wait();
                        sup.start()
                    })
                })
                .collect();

            let mut started = Vec::new();
            for racer in racers {
                started.extend(racer.await.unwrap());
            }
            assert_eq!(started.len(), 1);

            while flaky.runs() == 0 {
                time::sleep(Duration::from_millis(1)).await;
            }
            sup.shutdown();
            started.pop().unwrap().await;
            assert_eq!(flaky.runs(), 1);
        }
    }

    #[tokio::test]
    async fn shutdown_before_start_is_a_noop() {
        let sup = supervise(Flaky::new("r1", 0));
        sup.shutdown();
        assert!(!sup.is_started());
        assert!(sup.inlet().is_none());
    }

    #[tokio::test]
    async fn completion_resolves_and_queue_closes_after_shutdown() {
        let sup = supervise(Flaky::new("r1", 0));
        let done = sup.start().unwrap();

        let outlet = sup.outlet().unwrap();
        sup.inlet()
            .unwrap()
            .push(Notification::new("t", Severity::Info, "m"))
            .await
            .unwrap();

        sup.shutdown();
        time::timeout(Duration::from_secs(1), done).await.unwrap();

        assert!(!sup.is_started());
        assert!(sup.inlet().is_none());
        assert_eq!(outlet.recv().await.unwrap().message(), "m");
        assert!(outlet.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn restarts_after_one_second_with_the_same_id() {
        let flaky = Flaky::new("r1", 1);
        let sup = supervise(Arc::clone(&flaky) as Arc<dyn ChannelComponent>);
        let mut events = sup.bus.subscribe();
        let done = sup.start().unwrap();

        while flaky.runs() < 2 {
            time::sleep(Duration::from_millis(10)).await;
        }

        let seen = flaky.seen.lock().unwrap().clone();
        let gap = seen[1].0 - seen[0].0;
        assert!(gap >= Duration::from_secs(1), "{gap:?}");
        assert!(gap < Duration::from_millis(1100), "{gap:?}");
        assert_eq!(seen[0].1, "r1");
        assert_eq!(seen[1].1, "r1");

        assert_eq!(
            drain_kinds(&mut events),
            [
                EventKind::ComponentStarting,
                EventKind::ComponentFailed,
                EventKind::BackoffScheduled,
                EventKind::ComponentStarting,
            ]
        );

        sup.shutdown();
        done.await;
    }

    #[tokio::test(start_paused = true)]
    async fn graceful_return_restarts_without_backoff() {
        let scripted = Scripted::new(vec![Step::Return, Step::Return, Step::Return]);
        let sup = supervise(Arc::clone(&scripted) as Arc<dyn ChannelComponent>);
        let mut events = sup.bus.subscribe();

        let begin = Instant::now();
        let done = sup.start().unwrap();
        while scripted.runs() < 4 {
            time::sleep(Duration::from_millis(1)).await;
        }
        assert!(begin.elapsed() < Duration::from_millis(10), "{:?}", begin.elapsed());

        sup.shutdown();
        done.await;
        assert_eq!(scripted.runs(), 4);

        let kinds = drain_kinds(&mut events);
        assert!(!kinds.contains(&EventKind::BackoffScheduled));
        let stopped = kinds
            .iter()
            .filter(|k| **k == EventKind::ComponentStopped)
            .count();
        assert_eq!(stopped, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn graceful_return_resets_the_backoff() {
        let scripted = Scripted::new(vec![Step::Fail, Step::Fail, Step::Return, Step::Fail]);
        let growing = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(10),
            factor: 2.0,
            jitter: crate::policies::Jitter::None,
        };
        let sup = supervise_with(Arc::clone(&scripted) as Arc<dyn ChannelComponent>, growing);
        let mut events = sup.bus.subscribe();

        let done = sup.start().unwrap();
        while scripted.runs() < 5 {
            time::sleep(Duration::from_millis(1)).await;
        }

        let delays: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|ev| ev.kind == EventKind::BackoffScheduled)
            .map(|ev| ev.delay_ms)
            .collect();
        assert_eq!(delays, [Some(100), Some(200), Some(100)]);

        let at = scripted.started_at.lock().unwrap().clone();
        assert!(at[3] - at[2] < Duration::from_millis(1));
        assert!(at[4] - at[3] >= Duration::from_millis(100));
        assert!(at[4] - at[3] < Duration::from_millis(200));

        sup.shutdown();
        done.await;
    }

    #[tokio::test(start_paused = true)]
    async fn error_during_teardown_is_not_retried() {
        let scripted = Scripted::new(vec![Step::FailOnCancel]);
        let sup = supervise(Arc::clone(&scripted) as Arc<dyn ChannelComponent>);
        let mut events = sup.bus.subscribe();

        let done = sup.start().unwrap();
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(scripted.runs(), 1);

        sup.shutdown();
        time::timeout(Duration::from_millis(100), done).await.unwrap();
        assert_eq!(scripted.runs(), 1);
        assert!(!sup.is_started());

        let kinds = drain_kinds(&mut events);
        assert!(!kinds.contains(&EventKind::BackoffScheduled));
        assert!(kinds.ends_with(&[EventKind::ComponentFailed, EventKind::ComponentTerminated]));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_backoff() {
        let flaky = Flaky::new("r1", u32::MAX);
        let sup = supervise(Arc::clone(&flaky) as Arc<dyn ChannelComponent>);
        let done = sup.start().unwrap();

        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(flaky.runs(), 1);

        let before = Instant::now();
        sup.shutdown();
        done.await;

        assert!(before.elapsed() < Duration::from_secs(1));
        assert_eq!(flaky.runs(), 1);
    }
}
