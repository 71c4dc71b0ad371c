//! ChannelRegistry - live channel, forwarder and computer sets

use std::sync::Arc;
use std::time::Instant;

use channels::{build_source, ChannelHandle, DropPolicy, FeedSender, SentenceFeed};
use computers::TwCurrentComputer;
use contracts::{
    ChannelDescriptor, ChannelKind, ChannelPatch, Computer, ComputerDescriptor, ComputerKind,
    ComputerPatch, ForwarderDescriptor, ForwarderKind, ForwarderPatch, Identity, LifecycleState,
    MuxSettings, SentenceEvent,
};
use forwarders::{build_forwarder, frame_line, ForwarderHandle};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use telemetry_cache::{DispatchOutcome, SentenceDispatcher, TelemetryCache};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use crate::collection::Collection;
use crate::context::MuxContext;
use crate::error::{RegistryError, Result};
use crate::factory::{FactoryContext, FactoryRegistry};

/// Listing entry: identity, state and current descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryView<D> {
    pub identity: String,
    pub state: LifecycleState,
    #[serde(flatten)]
    pub descriptor: D,
}

/// Called once per sentence that reached the dispatcher
pub type SentenceObserver = Arc<dyn Fn(&SentenceEvent, &DispatchOutcome) + Send + Sync>;

fn dropped(reason: &'static str) {
    metrics::counter!("nmea_sentences_dropped_total", "reason" => reason).increment(1);
}

pub struct ChannelRegistry {
    context: Arc<MuxContext>,
    dispatcher: SentenceDispatcher,
    factories: FactoryRegistry,
    feed: SentenceFeed,
    channels: Collection<ChannelHandle>,
    forwarders: Collection<ForwarderHandle>,
    computers: Collection<dyn Computer>,
    /// Serializes add / remove / update
    mutation: tokio::sync::Mutex<()>,
    pump: Mutex<Option<JoinHandle<()>>>,
    observer: RwLock<Option<SentenceObserver>>,
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.channels.snapshot().len())
            .field("forwarders", &self.forwarders.snapshot().len())
            .field("computers", &self.computers.snapshot().len())
            .finish()
    }
}

impl ChannelRegistry {
    pub fn new(cache: Arc<TelemetryCache>, settings: &MuxSettings) -> Self {
        Self::with_factories(cache, settings, FactoryRegistry::new())
    }

    pub fn with_factories(
        cache: Arc<TelemetryCache>,
        settings: &MuxSettings,
        factories: FactoryRegistry,
    ) -> Self {
        Self {
            dispatcher: SentenceDispatcher::new(Arc::clone(&cache)),
            context: Arc::new(MuxContext::new(cache)),
            factories,
            feed: SentenceFeed::new(settings.feed_capacity, DropPolicy::DropNewest),
            channels: Collection::new("channels"),
            forwarders: Collection::new("forwarders"),
            computers: Collection::new("computers"),
            mutation: tokio::sync::Mutex::new(()),
            pump: Mutex::new(None),
            observer: RwLock::new(None),
        }
    }

    pub fn context(&self) -> &Arc<MuxContext> {
        &self.context
    }

    pub fn cache(&self) -> &Arc<TelemetryCache> {
        self.context.cache()
    }

    /// Producer handle for injecting sentences
    pub fn feed(&self) -> FeedSender {
        self.feed.sender()
    }

    pub fn factory_context(&self) -> FactoryContext {
        FactoryContext {
            feed: self.feed.sender(),
            cache: Arc::clone(self.cache()),
        }
    }

    /// Install a hook that sees every dispatched sentence with its outcome
    pub fn set_observer(&self, observer: SentenceObserver) {
        *self.observer.write() = Some(observer);
    }

    /// Spawn the task draining the feed into `on_sentence`. Idempotent.
    pub fn start(self: &Arc<Self>) {
        let mut pump = self.pump.lock();
        if pump.is_some() {
            return;
        }
        let receiver = self.feed.receiver();
        let registry = Arc::downgrade(self);
        *pump = Some(tokio::spawn(async move {
            while let Ok(event) = receiver.recv().await {
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.on_sentence(&event);
            }
            debug!("sentence pump stopped");
        }));
        debug!("sentence pump started");
    }

    /// Route one sentence.
    ///
    /// Returns `None` when the sentence was dropped before reaching the
    /// cache: its channel's filters rejected it or its channel is no longer
    /// registered. Bad-checksum sentences reach no forwarder or computer.
    pub fn on_sentence(&self, event: &SentenceEvent) -> Option<DispatchOutcome> {
        if let Some(origin) = &event.origin {
            let Some(channel) = self.channels.find(origin) else {
                trace!(channel = %origin, "sentence from unregistered channel");
                dropped("unknown_origin");
                return None;
            };
            if !channel.accepts(&event.sentence) {
                dropped("filtered");
                return None;
            }
        }

        let started = Instant::now();
        let outcome = self.dispatcher.dispatch(&event.sentence);
        metrics::histogram!("dispatch_duration_seconds").record(started.elapsed().as_secs_f64());
        if let Some(observer) = self.observer.read().as_ref() {
            observer(event, &outcome);
        }
        if outcome == DispatchOutcome::BadChecksum {
            dropped("bad_checksum");
            return Some(outcome);
        }

        let forwarders = self.forwarders.snapshot();
        if !forwarders.is_empty() {
            let line = frame_line(&event.sentence);
            for forwarder in forwarders.iter().filter(|f| f.is_running()) {
                forwarder.try_send(line.clone());
            }
        }

        for computer in self.computers.snapshot().iter() {
            if computer.state() == LifecycleState::Running {
                computer.on_sentence(&event.sentence);
            }
        }

        self.context.record(&event.sentence, event.received_at);
        Some(outcome)
    }

    // ========================================================================
    // Channels
    // ========================================================================

    #[instrument(
        name = "registry_add_channel",
        skip(self, descriptor),
        fields(channel = %descriptor.identity())
    )]
    pub async fn add_channel(&self, descriptor: ChannelDescriptor) -> Result<Identity> {
        let _guard = self.mutation.lock().await;
        descriptor.validate()?;
        let identity = descriptor.identity();
        if self.channels.contains(&identity) {
            return Err(RegistryError::conflict(identity));
        }

        let source = match &descriptor.kind {
            ChannelKind::Custom { .. } => self
                .factories
                .build_channel(&descriptor, &self.factory_context())?,
            _ => build_source(&descriptor)
                .map_err(|e| RegistryError::from_channel(identity.clone(), e))?,
        };

        let handle = Arc::new(ChannelHandle::new(descriptor, source));
        self.channels.push(Arc::clone(&handle));
        handle.start(self.feed.sender());
        info!("channel added");
        Ok(identity)
    }

    #[instrument(name = "registry_remove_channel", skip(self), fields(channel = %identity))]
    pub async fn remove_channel(&self, identity: &Identity) -> Result<ChannelDescriptor> {
        let _guard = self.mutation.lock().await;
        let handle = self
            .channels
            .remove(identity)
            .ok_or_else(|| RegistryError::not_found(identity.clone()))?;
        handle.stop();
        info!("channel removed");
        Ok(handle.descriptor())
    }

    pub async fn update_channel(&self, identity: &Identity, patch: &ChannelPatch) -> Result<()> {
        let _guard = self.mutation.lock().await;
        let handle = self
            .channels
            .find(identity)
            .ok_or_else(|| RegistryError::not_found(identity.clone()))?;
        handle.update(patch)?;
        debug!(channel = %identity, "channel updated");
        Ok(())
    }

    pub fn channels(&self) -> Vec<EntryView<ChannelDescriptor>> {
        self.channels
            .snapshot()
            .iter()
            .map(|c| EntryView {
                identity: c.identity().to_string(),
                state: c.state(),
                descriptor: c.descriptor(),
            })
            .collect()
    }

    // ========================================================================
    // Forwarders
    // ========================================================================

    #[instrument(
        name = "registry_add_forwarder",
        skip(self, descriptor),
        fields(forwarder = %descriptor.identity())
    )]
    pub async fn add_forwarder(&self, descriptor: ForwarderDescriptor) -> Result<Identity> {
        let _guard = self.mutation.lock().await;
        descriptor.validate()?;
        let identity = descriptor.identity();
        if self.forwarders.contains(&identity) {
            return Err(RegistryError::conflict(identity));
        }

        let handle = match &descriptor.kind {
            ForwarderKind::Custom { .. } => self
                .factories
                .build_forwarder(&descriptor, &self.factory_context())?,
            _ => build_forwarder(&descriptor)
                .await
                .map_err(|e| RegistryError::from_forwarder(identity.clone(), e))?,
        };

        self.forwarders.push(Arc::new(handle));
        info!("forwarder added");
        Ok(identity)
    }

    /// Drains the forwarder's queue and closes it before returning
    #[instrument(name = "registry_remove_forwarder", skip(self), fields(forwarder = %identity))]
    pub async fn remove_forwarder(&self, identity: &Identity) -> Result<ForwarderDescriptor> {
        let _guard = self.mutation.lock().await;
        let handle = self
            .forwarders
            .remove(identity)
            .ok_or_else(|| RegistryError::not_found(identity.clone()))?;
        handle.stop().await;
        info!("forwarder removed");
        Ok(handle.descriptor())
    }

    pub async fn update_forwarder(
        &self,
        identity: &Identity,
        patch: &ForwarderPatch,
    ) -> Result<()> {
        let _guard = self.mutation.lock().await;
        let handle = self
            .forwarders
            .find(identity)
            .ok_or_else(|| RegistryError::not_found(identity.clone()))?;
        handle.update(patch)?;
        debug!(forwarder = %identity, "forwarder updated");
        Ok(())
    }

    pub fn forwarders(&self) -> Vec<EntryView<ForwarderDescriptor>> {
        self.forwarders
            .snapshot()
            .iter()
            .map(|f| EntryView {
                identity: f.identity().to_string(),
                state: f.state(),
                descriptor: f.descriptor(),
            })
            .collect()
    }

    // ========================================================================
    // Computers
    // ========================================================================

    #[instrument(
        name = "registry_add_computer",
        skip(self, descriptor),
        fields(computer = %descriptor.identity())
    )]
    pub async fn add_computer(&self, descriptor: ComputerDescriptor) -> Result<Identity> {
        let _guard = self.mutation.lock().await;
        descriptor.validate()?;
        let identity = descriptor.identity();
        if self.computers.contains(&identity) {
            return Err(RegistryError::conflict(identity));
        }

        let context = self.factory_context();
        let computer: Arc<dyn Computer> = match &descriptor.kind {
            ComputerKind::TwCurrent { .. } => Arc::new(TwCurrentComputer::from_descriptor(
                &descriptor,
                Arc::clone(&context.cache),
                context.emitter(),
            )?),
            ComputerKind::Custom { .. } => self.factories.build_computer(&descriptor, &context)?,
        };

        computer.start();
        self.computers.push(computer);
        info!("computer added");
        Ok(identity)
    }

    #[instrument(name = "registry_remove_computer", skip(self), fields(computer = %identity))]
    pub async fn remove_computer(&self, identity: &Identity) -> Result<ComputerDescriptor> {
        let _guard = self.mutation.lock().await;
        let computer = self
            .computers
            .remove(identity)
            .ok_or_else(|| RegistryError::not_found(identity.clone()))?;
        computer.stop();
        info!("computer removed");
        Ok(computer.descriptor())
    }

    pub async fn update_computer(&self, identity: &Identity, patch: &ComputerPatch) -> Result<()> {
        let _guard = self.mutation.lock().await;
        let computer = self
            .computers
            .find(identity)
            .ok_or_else(|| RegistryError::not_found(identity.clone()))?;
        computer.update(patch)?;
        debug!(computer = %identity, "computer updated");
        Ok(())
    }

    pub fn computers(&self) -> Vec<EntryView<ComputerDescriptor>> {
        self.computers
            .snapshot()
            .iter()
            .map(|c| {
                let descriptor = c.descriptor();
                EntryView {
                    identity: descriptor.identity().to_string(),
                    state: c.state(),
                    descriptor,
                }
            })
            .collect()
    }

    /// Reset the cache and every computer's accumulated samples
    pub fn reset_cache(&self) {
        self.cache().reset();
        for computer in self.computers.snapshot().iter() {
            computer.reset();
        }
        info!("cache cleared");
    }

    /// Stop every entry and the pump.
    ///
    /// Channels and computers stop first; sentences still queued are then
    /// routed to the forwarders, which are drained and closed last.
    #[instrument(name = "registry_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        let _guard = self.mutation.lock().await;
        for channel in self.channels.take() {
            channel.stop();
        }
        for computer in self.computers.take() {
            computer.stop();
        }

        self.feed.close();
        let pump = self.pump.lock().take();
        if let Some(pump) = pump {
            if let Err(e) = pump.await {
                warn!(error = ?e, "sentence pump panicked");
            }
        }

        for forwarder in self.forwarders.take() {
            forwarder.stop().await;
        }
        info!("registry shut down");
    }
}
