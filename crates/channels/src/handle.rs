//! ChannelHandle - a running input channel.
//!
//! Wraps a `SentenceSource` with the channel's identity, filters, verbose
//! flag and lifecycle. Lines are pushed into the feed unfiltered; the
//! registry asks `accepts` when routing so that filter updates take effect
//! on queued sentences too.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{
    ChannelDescriptor, ChannelPatch, ContractError, Identity, Lifecycle, LifecycleState,
    SentenceCallback, SentenceEvent, SentenceSource,
};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, trace};

use crate::{ChannelMetrics, FeedSender, MetricsSnapshot, SentenceFilter};

pub struct ChannelHandle {
    identity: Identity,
    descriptor: RwLock<ChannelDescriptor>,
    filter: RwLock<SentenceFilter>,
    source: Box<dyn SentenceSource>,
    lifecycle: Arc<Lifecycle>,
    verbose: Arc<AtomicBool>,
    metrics: Arc<ChannelMetrics>,
}

impl std::fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("identity", &self.identity)
            .field("source", &self.source.name())
            .field("state", &self.lifecycle.state())
            .finish()
    }
}

impl ChannelHandle {
    pub fn new(descriptor: ChannelDescriptor, source: Box<dyn SentenceSource>) -> Self {
        let filter = SentenceFilter::new(&descriptor.device_filters, &descriptor.sentence_filters);
        Self {
            identity: descriptor.identity(),
            verbose: Arc::new(AtomicBool::new(descriptor.verbose)),
            filter: RwLock::new(filter),
            descriptor: RwLock::new(descriptor),
            source,
            lifecycle: Arc::new(Lifecycle::new()),
            metrics: Arc::new(ChannelMetrics::new()),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Current descriptor, patched fields included
    pub fn descriptor(&self) -> ChannelDescriptor {
        self.descriptor.read().clone()
    }

    /// Start the source; false if it was already started or stopped
    #[instrument(name = "channel_start", skip(self, feed), fields(channel = %self.identity))]
    pub fn start(&self, feed: FeedSender) -> bool {
        if !self.lifecycle.start() {
            return false;
        }

        let identity = self.identity.clone();
        let origin = identity.to_string();
        let lifecycle = self.lifecycle.clone();
        let verbose = self.verbose.clone();
        let metrics = self.metrics.clone();

        let callback: SentenceCallback = Arc::new(move |line: String| {
            if !lifecycle.is_running() {
                return;
            }
            metrics.record_received(line.len());
            metrics::counter!("nmea_sentences_received_total", "origin" => origin.clone())
                .increment(1);
            if verbose.load(Ordering::Relaxed) {
                info!(channel = %origin, sentence = %line, "read");
            } else {
                trace!(channel = %origin, sentence = %line, "read");
            }
            if !feed.push(SentenceEvent::from_channel(identity.clone(), line)) {
                metrics.record_dropped();
                metrics::counter!("nmea_sentences_dropped_total", "reason" => "feed_full")
                    .increment(1);
            }
        });

        debug!(source = %self.source.name(), "starting channel");
        self.source.listen(callback);
        true
    }

    /// Stop the source and release its transport. Idempotent.
    pub fn stop(&self) {
        if self.lifecycle.stop() {
            debug!(channel = %self.identity, "stopping channel");
            self.source.stop();
        }
    }

    /// Lifecycle state, `Failed` once the transport has faulted
    pub fn state(&self) -> LifecycleState {
        if self.source.has_failed() {
            self.lifecycle.fail();
        }
        self.lifecycle.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    /// Apply this channel's filters; rejected sentences are counted
    pub fn accepts(&self, sentence: &str) -> bool {
        let accepted = self.filter.read().accepts(sentence);
        if !accepted {
            self.metrics.record_filtered();
        }
        accepted
    }

    /// Apply the mutable fields of `patch`
    pub fn update(&self, patch: &ChannelPatch) -> Result<(), ContractError> {
        let mut descriptor = self.descriptor.write();
        let mut next = descriptor.clone();
        if let Some(verbose) = patch.verbose {
            next.verbose = verbose;
        }
        if let Some(filters) = &patch.device_filters {
            next.device_filters = filters.clone();
        }
        if let Some(filters) = &patch.sentence_filters {
            next.sentence_filters = filters.clone();
        }
        next.validate()?;

        *self.filter.write() = SentenceFilter::new(&next.device_filters, &next.sentence_filters);
        self.verbose.store(next.verbose, Ordering::Relaxed);
        *descriptor = next;
        Ok(())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DropPolicy, SentenceFeed};
    use contracts::ChannelKind;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct ManualState {
        callback: Mutex<Option<SentenceCallback>>,
        failed: AtomicBool,
    }

    /// Source whose callback the test drives by hand
    #[derive(Clone, Default)]
    struct ManualSource(Arc<ManualState>);

    impl ManualSource {
        fn emit(&self, line: &str) {
            if let Some(callback) = self.0.callback.lock().as_ref() {
                callback(line.to_string());
            }
        }

        fn fail(&self) {
            self.0.failed.store(true, Ordering::Relaxed);
        }
    }

    impl SentenceSource for ManualSource {
        fn name(&self) -> &str {
            "manual"
        }

        fn listen(&self, callback: SentenceCallback) {
            *self.0.callback.lock() = Some(callback);
        }

        fn stop(&self) {
            self.0.callback.lock().take();
        }

        fn is_listening(&self) -> bool {
            self.0.callback.lock().is_some()
        }

        fn has_failed(&self) -> bool {
            self.0.failed.load(Ordering::Relaxed)
        }
    }

    fn tcp_descriptor() -> ChannelDescriptor {
        ChannelDescriptor::new(ChannelKind::Tcp {
            host: "localhost".into(),
            port: 7001,
        })
        .with_sentence_filters(["RMC"])
    }

    #[test]
    fn test_lines_reach_feed_with_origin() {
        let source = ManualSource::default();
        let handle = ChannelHandle::new(tcp_descriptor(), Box::new(source.clone()));
        let feed = SentenceFeed::new(8, DropPolicy::DropNewest);

        assert!(handle.start(feed.sender()));
        assert!(!handle.start(feed.sender()));
        source.emit("$GPRMC,1*00");

        let event = feed.receiver().try_recv().unwrap();
        assert_eq!(event.origin.as_ref(), Some(handle.identity()));
        assert_eq!(handle.identity().to_string(), "tcp:localhost:7001");
        assert!(handle.accepts(&event.sentence));
        assert!(!handle.accepts("$IIMWV,1*00"));
        assert_eq!(handle.metrics().sentences_filtered, 1);
    }

    #[test]
    fn test_full_feed_counts_drops() {
        let source = ManualSource::default();
        let handle = ChannelHandle::new(tcp_descriptor(), Box::new(source.clone()));
        let feed = SentenceFeed::new(1, DropPolicy::DropNewest);
        handle.start(feed.sender());

        source.emit("$GPRMC,1*00");
        source.emit("$GPRMC,2*00");
        let metrics = handle.metrics();
        assert_eq!(metrics.sentences_received, 2);
        assert_eq!(metrics.sentences_dropped, 1);
    }

    #[test]
    fn test_stop_and_failure() {
        let source = ManualSource::default();
        let handle = ChannelHandle::new(tcp_descriptor(), Box::new(source.clone()));
        let feed = SentenceFeed::new(4, DropPolicy::DropNewest);
        handle.start(feed.sender());

        source.fail();
        assert_eq!(handle.state(), LifecycleState::Failed);

        handle.stop();
        handle.stop();
        assert_eq!(handle.state(), LifecycleState::Stopped);
        assert!(!source.is_listening());
    }

    #[test]
    fn test_update_filters() {
        let source = ManualSource::default();
        let handle = ChannelHandle::new(tcp_descriptor(), Box::new(source));
        handle
            .update(&ChannelPatch {
                verbose: Some(true),
                device_filters: None,
                sentence_filters: Some(vec!["MWV".into()]),
            })
            .unwrap();
        assert!(handle.is_verbose());
        assert!(handle.accepts("$IIMWV,1*00"));
        assert!(!handle.accepts("$GPRMC,1*00"));
        assert_eq!(handle.descriptor().sentence_filters, vec!["MWV".to_string()]);

        let rejected = handle.update(&ChannelPatch {
            verbose: None,
            device_filters: Some(vec![" ".into()]),
            sentence_filters: None,
        });
        assert!(rejected.is_err());
        assert!(handle.accepts("$IIMWV,1*00"));
    }
}
