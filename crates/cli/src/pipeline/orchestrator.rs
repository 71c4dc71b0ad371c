//! Mux orchestrator - builds the cache and registry from configuration,
//! runs until shutdown and tears everything down in order.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{LifecycleState, MuxConfig, SentenceEvent};
use observability::MuxStatsAggregator;
use parking_lot::Mutex;
use registry::{ChannelRegistry, SentenceObserver};
use telemetry_cache::{DispatchOutcome, TelemetryCache};
use tracing::{info, warn};

use super::RunStats;
use crate::error::{CliError, Result};

#[derive(Debug, Clone)]
pub struct MuxRunConfig {
    pub config: MuxConfig,

    /// Stop after this long (None = until the shutdown future resolves)
    pub duration: Option<Duration>,

    /// Period of the status log line (None = never)
    pub status_interval: Option<Duration>,

    /// Prometheus exporter port (None = disabled)
    pub metrics_port: Option<u16>,
}

pub struct Mux {
    config: MuxRunConfig,
}

impl Mux {
    pub fn new(config: MuxRunConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves or the configured duration elapses.
    ///
    /// Forwarders and computers are registered before channels so the
    /// first sentences read already have somewhere to go.
    pub async fn run<S>(self, shutdown: S) -> Result<RunStats>
    where
        S: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let config = &self.config.config;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port).map_err(CliError::Metrics)?;
        }

        let cache = Arc::new(TelemetryCache::from_settings(&config.cache));
        let registry = Arc::new(ChannelRegistry::new(cache, &config.mux));
        let aggregator = Arc::new(Mutex::new(MuxStatsAggregator::new()));
        registry.set_observer(stats_observer(Arc::clone(&aggregator)));
        registry.start();

        if let Err(e) = populate(&registry, config).await {
            registry.shutdown().await;
            return Err(e);
        }

        info!(
            channels = config.channels.len(),
            forwarders = config.forwarders.len(),
            computers = config.computers.len(),
            "mux running"
        );

        let deadline = async {
            match self.config.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        let status = status_loop(&registry, self.config.status_interval);

        tokio::select! {
            _ = shutdown => warn!("shutdown requested"),
            _ = deadline => info!("run duration elapsed"),
            _ = status => {}
        }

        let active_channels = registry
            .channels()
            .iter()
            .filter(|c| c.state == LifecycleState::Running)
            .count();
        let active_forwarders = registry
            .forwarders()
            .iter()
            .filter(|f| f.state == LifecycleState::Running)
            .count();
        registry.shutdown().await;

        let summary = aggregator.lock().summary();
        Ok(RunStats {
            duration: start_time.elapsed(),
            nmea_bytes: registry.context().volume().nmea_bytes,
            active_channels,
            active_forwarders,
            computers: config.computers.len(),
            last_sentence: registry.context().last_sentence().map(|s| s.last_data),
            summary,
        })
    }
}

async fn populate(registry: &ChannelRegistry, config: &MuxConfig) -> Result<()> {
    for descriptor in &config.forwarders {
        let identity = descriptor.identity();
        registry
            .add_forwarder(descriptor.clone())
            .await
            .map_err(|e| CliError::startup(&identity, e))?;
    }
    for descriptor in &config.computers {
        let identity = descriptor.identity();
        registry
            .add_computer(descriptor.clone())
            .await
            .map_err(|e| CliError::startup(&identity, e))?;
    }
    for descriptor in &config.channels {
        let identity = descriptor.identity();
        registry
            .add_channel(descriptor.clone())
            .await
            .map_err(|e| CliError::startup(&identity, e))?;
    }
    Ok(())
}

fn stats_observer(aggregator: Arc<Mutex<MuxStatsAggregator>>) -> SentenceObserver {
    Arc::new(move |event: &SentenceEvent, outcome: &DispatchOutcome| {
        let origin = event.origin.as_ref().map(|o| o.to_string());
        let label = outcome.as_str();
        observability::record_sentence(
            origin.as_deref().unwrap_or(observability::LOCAL_ORIGIN),
            label,
            event.sentence.len(),
        );
        aggregator
            .lock()
            .update(origin.as_deref(), &event.sentence, label);
    })
}

/// Periodic status line; never resolves
async fn status_loop(registry: &ChannelRegistry, interval: Option<Duration>) {
    let Some(interval) = interval else {
        return std::future::pending().await;
    };
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let volume = registry.context().volume();
        let failed: Vec<String> = registry
            .channels()
            .into_iter()
            .filter(|c| c.state != LifecycleState::Running)
            .map(|c| c.identity)
            .collect();
        info!(
            nmea_bytes = volume.nmea_bytes,
            cached = registry.cache().len(),
            "status"
        );
        if !failed.is_empty() {
            warn!(channels = ?failed, "channels not running");
        }
    }
}
