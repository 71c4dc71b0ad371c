//! # Integration Tests
//!
//! End-to-end scenarios across config loading, the registry, computers and
//! forwarders. Nothing here needs a network peer: inputs are log files,
//! idle custom channels or sentences pushed straight into the feed.

#[cfg(test)]
mod support {
    use std::future::Future;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        MuxSettings, SentenceCallback, SentenceEvent, SentenceSource,
    };
    use parking_lot::Mutex;
    use registry::{ChannelRegistry, FactoryRegistry};
    use telemetry_cache::{DispatchOutcome, TelemetryCache};

    pub const RMC: &str =
        "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    /// Source that never reads anything
    #[derive(Default)]
    pub struct IdleSource {
        listening: Mutex<bool>,
    }

    impl SentenceSource for IdleSource {
        fn name(&self) -> &str {
            "idle"
        }

        fn listen(&self, _callback: SentenceCallback) {
            *self.listening.lock() = true;
        }

        fn stop(&self) {
            *self.listening.lock() = false;
        }

        fn is_listening(&self) -> bool {
            *self.listening.lock()
        }
    }

    /// Registry with an `idle` channel factory, plus a log of every
    /// dispatched sentence
    pub fn registry() -> (Arc<ChannelRegistry>, Arc<Mutex<Vec<(String, &'static str)>>>) {
        let mut factories = FactoryRegistry::new();
        factories.register_channel("idle", |_, _| {
            Ok(Box::new(IdleSource::default()) as Box<dyn SentenceSource>)
        });
        let registry = Arc::new(ChannelRegistry::with_factories(
            Arc::new(TelemetryCache::new()),
            &MuxSettings::default(),
            factories,
        ));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.set_observer(Arc::new(
            move |event: &SentenceEvent, outcome: &DispatchOutcome| {
                sink.lock().push((event.sentence.to_string(), outcome.as_str()));
            },
        ));
        (registry, seen)
    }

    /// Poll `condition` every 10ms for up to two seconds
    pub async fn eventually<F>(mut condition: F) -> bool
    where
        F: FnMut() -> bool,
    {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    pub async fn within<T>(future: impl Future<Output = T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), future)
            .await
            .expect("timed out")
    }
}

#[cfg(test)]
mod config_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::MeasurementKey;
    use registry::ChannelRegistry;
    use telemetry_cache::TelemetryCache;

    use crate::support::{eventually, within, RMC};

    /// Config file -> registry: a filtered log replay reaches the cache and
    /// a file forwarder
    #[tokio::test]
    async fn test_config_driven_replay() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.nmea");
        let output = dir.path().join("out.nmea");
        let mwv = nmea_codec::generate::mwv("II", 30.0, 12.0, nmea_codec::WindReference::Apparent);
        std::fs::write(&input, format!("{mwv}\n{RMC}\n")).unwrap();

        let content = format!(
            r#"
[cache]
damping = 1

[[channels]]
kind = "file"
path = "{}"
between_records_ms = 0
sentence_filters = ["RMC"]

[[forwarders]]
kind = "file"
path = "{}"
append = false
"#,
            input.display(),
            output.display()
        );
        let config = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();

        let cache = Arc::new(TelemetryCache::from_settings(&config.cache));
        let registry = Arc::new(ChannelRegistry::new(Arc::clone(&cache), &config.mux));
        registry.start();
        for forwarder in &config.forwarders {
            registry.add_forwarder(forwarder.clone()).await.unwrap();
        }
        for channel in &config.channels {
            registry.add_channel(channel.clone()).await.unwrap();
        }

        assert!(eventually(|| cache.contains(MeasurementKey::Sog)).await);
        within(registry.shutdown()).await;

        assert_eq!(cache.get_f64(MeasurementKey::Sog), Some(22.4));
        assert!(!cache.contains(MeasurementKey::Aws));
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            format!("{RMC}\r\n")
        );
    }
}

#[cfg(test)]
mod registry_tests {
    use contracts::{
        ChannelDescriptor, ChannelKind, ForwarderDescriptor, ForwarderKind, Identity,
    };
    use registry::{Admin, RegistryError};

    use crate::support::{registry, within};

    fn tcp_channel() -> ChannelDescriptor {
        ChannelDescriptor::new(ChannelKind::Tcp {
            host: "localhost".into(),
            port: 7001,
        })
    }

    #[tokio::test]
    async fn test_duplicate_identity_conflicts() {
        let (registry, _) = registry();
        registry.add_channel(tcp_channel()).await.unwrap();

        let err = registry
            .add_channel(tcp_channel().with_sentence_filters(["RMC"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));
        assert_eq!(err.status_code(), 400);
        assert_eq!(registry.channels().len(), 1);

        within(registry.shutdown()).await;
    }

    #[tokio::test]
    async fn test_remove_unknown_forwarder_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry();
        let admin = Admin::new(registry.clone());
        admin
            .add_forwarder(ForwarderDescriptor::new(ForwarderKind::File {
                path: dir.path().join("out.nmea"),
                append: true,
            }))
            .await
            .unwrap();

        let unknown = Identity::new("tcp", "7002");
        let err = registry.remove_forwarder(&unknown).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
        assert_eq!(admin.remove_forwarder(&unknown).await.unwrap_err().status, 404);
        assert_eq!(admin.forwarders().len(), 1);

        within(registry.shutdown()).await;
    }
}

#[cfg(test)]
mod computer_tests {
    use contracts::{
        ChannelDescriptor, ChannelKind, ComputerDescriptor, ComputerKind, FactoryParams,
        ForwarderDescriptor, ForwarderKind, MeasurementKey, SentenceEvent,
    };
    use nmea_codec::generate::with_checksum;
    use registry::Admin;

    use crate::support::{eventually, registry, within};

    /// Sentences injected into the feed drive tw-current, whose VDR output
    /// goes back through the feed and out of the forwarder
    #[tokio::test]
    async fn test_current_sentences_are_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.nmea");
        let (registry, seen) = registry();
        registry.start();

        registry
            .add_forwarder(ForwarderDescriptor::new(ForwarderKind::File {
                path: output.clone(),
                append: false,
            }))
            .await
            .unwrap();
        registry
            .add_computer(ComputerDescriptor::new(ComputerKind::TwCurrent {
                prefix: "CC".into(),
                time_buffer_lengths: vec![5000, 60_000],
            }))
            .await
            .unwrap();
        registry
            .add_channel(ChannelDescriptor::new(ChannelKind::Custom {
                factory: "idle".into(),
                params: FactoryParams::default(),
            }))
            .await
            .unwrap();

        let feed = registry.feed();
        for body in [
            "IIHDT,000.0,T",
            "IIVHW,,T,,M,5.0,N,,K",
            "GPRMC,120000,A,4807.038,N,01131.000,E,5.099,011.3,010624,,",
        ] {
            assert!(feed.push(SentenceEvent::unattributed(with_checksum(body))));
        }

        assert!(
            eventually(|| seen
                .lock()
                .iter()
                .any(|(sentence, _)| sentence.starts_with("$CCVDR,")))
            .await
        );
        assert!(registry.cache().contains(MeasurementKey::HdgTrue));

        let snapshot = Admin::new(registry.clone()).cache_snapshot().unwrap();
        let current = snapshot["calculated_current"].as_object().unwrap();
        assert_eq!(current.len(), 2);

        within(registry.shutdown()).await;

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("$GPRMC,120000"));
        assert!(written.lines().any(|l| l.starts_with("$CCVDR,")));
        assert!(written.lines().all(|l| nmea_codec::valid_checksum(l)));
    }
}
