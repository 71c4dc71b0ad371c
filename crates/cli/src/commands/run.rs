//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Mux, MuxRunConfig};

pub async fn run_mux(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(damping) = args.damping {
        if damping == 0 {
            anyhow::bail!("--damping must be >= 1");
        }
        info!(damping, "Overriding cache damping from CLI");
        config.cache.damping = damping;
    }

    info!(
        channels = config.channels.len(),
        forwarders = config.forwarders.len(),
        computers = config.computers.len(),
        damping = config.cache.damping,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    let mux = Mux::new(MuxRunConfig {
        config,
        duration: seconds(args.duration),
        status_interval: seconds(args.status_interval),
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    let stats = mux
        .run(shutdown_signal())
        .await
        .context("Mux execution failed")?;

    info!(
        sentences = stats.summary.total_sentences,
        nmea_bytes = stats.nmea_bytes,
        duration_secs = stats.duration.as_secs_f64(),
        "Mux stopped"
    );
    stats.print_summary();
    Ok(())
}

fn seconds(value: u64) -> Option<Duration> {
    (value != 0).then(|| Duration::from_secs(value))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
