use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use notifier::{Config, Orchestrator, Registry, Role, RuntimeError, ShutdownSignal};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "notifier", version, about = "Relay notifications from receivers to senders")]
struct Cli {
    /// Path of the YAML configuration file.
    #[arg(env = "NOTIFIER_CONFIG")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Validate the configuration, build every component, then exit.
    #[arg(long, default_value_t = false)]
    check: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = Config::load(&cli.config).context("invalid configuration")?;
    let registry = Registry::standard();
    tracing::debug!(
        receivers = ?registry.kinds(Role::Receiver),
        senders = ?registry.kinds(Role::Sender),
        "registered kinds"
    );
    let relay =
        Orchestrator::from_config(&registry, &config).context("failed to build components")?;

    if cli.check {
        tracing::info!(path = %cli.config.display(), "configuration is valid");
        return Ok(());
    }

    let signal = ShutdownSignal::install().map_err(RuntimeError::Signal)?;
    relay.run(signal.recv()).await?;
    tracing::info!("shutdown complete");
    Ok(())
}
