//! # Orchestrator: topology wiring and ordered shutdown.
//!
//! ## Topology
//! ```text
//! receiver sup ──outlet──► forwarder ──┐
//! receiver sup ──outlet──► forwarder ──┼──► router input (mpsc) ──► Router ──► sender sups
//! receiver sup ──outlet──► forwarder ──┘
//! ```
//!
//! ## Start order
//! Senders first, then receivers (senders must accept before receivers produce),
//! then one forwarder per receiver, then the router task.
//!
//! ## Shutdown sequence ([`Running::shutdown`])
//! ```text
//! 1. shutdown every receiver ──► await all completions        (ReceiversStopped)
//! 2. close router input ──► await forwarders + router,
//!    bounded by drain grace                                   (RouterDrained | DrainExceeded)
//! 3. shutdown every sender ──► await all completions          (SendersStopped)
//! ```
//! Step 2 guarantees that every notification accepted by a receiver queue has
//! reached the sender queues before the senders are asked to stop. When the grace
//! elapses, the remaining deliveries are aborted and shutdown continues.

use std::{future::Future, sync::Arc, time::Duration};

use futures::future::join_all;
use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
    time,
};
use tracing::Instrument;

use crate::{
    channel::Outlet,
    config::{Config, RuntimeConfig},
    core::{
        registry::{Fleet, Registry},
        router::Router,
        supervisor::{Completion, Supervisor},
    },
    error::{BuildError, RuntimeError},
    events::{Bus, Event, EventKind},
    notification::Notification,
};

/// A built but not yet started relay.
pub struct Orchestrator {
    fleet: Fleet,
    runtime: RuntimeConfig,
    bus: Bus,
}

impl Orchestrator {
    /// Wraps an already built fleet. `bus` must be the one its supervisors publish to.
    pub fn new(fleet: Fleet, runtime: RuntimeConfig, bus: Bus) -> Self {
        Self {
            fleet,
            runtime,
            bus,
        }
    }

    /// Builds the fleet described by `config` with `registry`.
    pub fn from_config(registry: &Registry, config: &Config) -> Result<Self, BuildError> {
        let bus = Bus::default();
        let fleet = registry.build(config, &bus)?;
        Ok(Self::new(fleet, config.runtime.clone(), bus))
    }

    /// Event bus shared by every supervisor of the fleet.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Starts senders, receivers, forwarders and the router.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> Running {
        let Fleet { receivers, senders } = self.fleet;

        let senders_done = start_all(&senders);
        let receivers_done = start_all(&receivers);

        let (router_tx, router_rx) = mpsc::channel(self.runtime.queue_capacity_clamped());
        let forwarders = receivers
            .iter()
            .filter_map(|receiver| {
                let outlet = receiver.outlet()?;
                Some(forward(receiver, outlet, router_tx.clone()))
            })
            .collect();
        let router = Router::new(senders.clone()).spawn(router_rx);

        tracing::info!(
            receivers = receivers.len(),
            senders = senders.len(),
            "relay started"
        );

        Running {
            receivers,
            senders,
            receivers_done,
            senders_done,
            router_tx,
            forwarders,
            router,
            drain_grace: self.runtime.drain_grace,
            bus: self.bus,
        }
    }

    /// Starts the relay, waits for `shutdown`, then runs the shutdown sequence.
    pub async fn run<F>(self, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let running = self.start();
        shutdown.await;
        running.shutdown().await
    }
}

/// A started relay. Dropping it without [`shutdown`](Running::shutdown) leaves
/// every task running.
#[must_use = "a running relay should be shut down"]
pub struct Running {
    receivers: Vec<Arc<Supervisor>>,
    senders: Vec<Arc<Supervisor>>,
    receivers_done: Vec<Completion>,
    senders_done: Vec<Completion>,
    router_tx: mpsc::Sender<Arc<Notification>>,
    forwarders: Vec<JoinHandle<()>>,
    router: JoinHandle<u64>,
    drain_grace: Duration,
    bus: Bus,
}

impl Running {
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn receivers(&self) -> &[Arc<Supervisor>] {
        &self.receivers
    }

    pub fn senders(&self) -> &[Arc<Supervisor>] {
        &self.senders
    }

    /// Ordered shutdown: receivers, router drain, senders.
    ///
    /// Always stops every component. Returns [`RuntimeError::DrainExceeded`] if
    /// in-flight notifications could not be delivered within the drain grace.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        let Running {
            receivers,
            senders,
            receivers_done,
            senders_done,
            router_tx,
            forwarders,
            router,
            drain_grace,
            bus,
        } = self;

        tracing::info!("shutdown requested");
        bus.publish(Event::new(EventKind::ShutdownRequested));

        receivers.iter().for_each(|r| r.shutdown());
        join_all(receivers_done).await;
        tracing::info!("receivers stopped");
        bus.publish(Event::new(EventKind::ReceiversStopped));

        drop(router_tx);
        let drained = drain(forwarders, router, drain_grace, &bus).await;

        senders.iter().for_each(|s| s.shutdown());
        join_all(senders_done).await;
        tracing::info!("senders stopped");
        bus.publish(Event::new(EventKind::SendersStopped));

        drained
    }
}

fn start_all(supervisors: &[Arc<Supervisor>]) -> Vec<Completion> {
    supervisors.iter().filter_map(|s| s.start()).collect()
}

fn forward(
    receiver: &Supervisor,
    outlet: Outlet,
    router_tx: mpsc::Sender<Arc<Notification>>,
) -> JoinHandle<()> {
    let span = tracing::info_span!("forwarder", receiver = receiver.id());
    tokio::spawn(
        async move {
            while let Some(n) = outlet.recv().await {
                if router_tx.send(n).await.is_err() {
                    tracing::warn!("router input closed; forwarder exits");
                    return;
                }
            }
            tracing::debug!("receiver queue closed");
        }
        .instrument(span),
    )
}

async fn drain(
    forwarders: Vec<JoinHandle<()>>,
    router: JoinHandle<u64>,
    grace: Duration,
    bus: &Bus,
) -> Result<(), RuntimeError> {
    let aborts: Vec<AbortHandle> = forwarders
        .iter()
        .map(JoinHandle::abort_handle)
        .chain(std::iter::once(router.abort_handle()))
        .collect();

    let barrier = async move {
        join_all(forwarders).await;
        router.await
    };

    match time::timeout(grace, barrier).await {
        Ok(res) => {
            match res {
                Ok(routed) => tracing::info!(routed, "router drained"),
                Err(err) => tracing::warn!(error = %err, "router task ended abnormally"),
            }
            bus.publish(Event::new(EventKind::RouterDrained));
            Ok(())
        }
        Err(_elapsed) => {
            aborts.iter().for_each(AbortHandle::abort);
            tracing::warn!(grace_ms = grace.as_millis() as u64, "router drain exceeded grace");
            bus.publish(Event::new(EventKind::DrainExceeded).with_delay(grace));
            Err(RuntimeError::DrainExceeded { grace })
        }
    }
}
