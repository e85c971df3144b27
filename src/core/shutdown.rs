//! # Cross-platform OS signal handling.
//!
//! [`ShutdownSignal`] registers its listeners when it is installed, so a signal
//! delivered while the relay is still starting up is not lost.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT`
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

/// Installed process-termination listeners.
#[derive(Debug)]
pub struct ShutdownSignal {
    #[cfg(unix)]
    listeners: [tokio::signal::unix::Signal; 3],
}

impl ShutdownSignal {
    /// Registers the listeners. Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            listeners: [
                signal(SignalKind::interrupt())?,
                signal(SignalKind::terminate())?,
                signal(SignalKind::quit())?,
            ],
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Completes when any termination signal is received.
    #[cfg(unix)]
    pub async fn recv(mut self) {
        let [sigint, sigterm, sigquit] = &mut self.listeners;
        let name = tokio::select! {
            _ = sigint.recv()  => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
            _ = sigquit.recv() => "SIGQUIT",
        };
        tracing::info!(signal = name, "termination signal received");
    }

    #[cfg(not(unix))]
    pub async fn recv(self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!(signal = "ctrl-c", "termination signal received"),
            Err(err) => {
                tracing::error!(error = %err, "ctrl-c listener failed");
                std::future::pending::<()>().await
            }
        }
    }
}
