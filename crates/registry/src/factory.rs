//! Factories for `custom` descriptors.
//!
//! Built-in kinds are matched on their descriptor tag; a `custom` descriptor
//! names one of the factories registered here and carries an opaque
//! parameter map for it.

use std::collections::HashMap;
use std::sync::Arc;

use channels::FeedSender;
use contracts::{
    ChannelDescriptor, ChannelKind, Computer, ComputerDescriptor, ComputerKind, ContractError,
    ForwarderDescriptor, ForwarderKind, SentenceCallback, SentenceEvent, SentenceSource,
};
use forwarders::ForwarderHandle;
use telemetry_cache::TelemetryCache;

use crate::error::{RegistryError, Result};

/// What a factory may reach: the sentence feed and the shared cache
#[derive(Debug, Clone)]
pub struct FactoryContext {
    pub feed: FeedSender,
    pub cache: Arc<TelemetryCache>,
}

impl FactoryContext {
    /// Callback injecting generated sentences back into the feed
    pub fn emitter(&self) -> SentenceCallback {
        let feed = self.feed.clone();
        Arc::new(move |sentence: String| {
            feed.push(SentenceEvent::unattributed(sentence));
        })
    }
}

pub type ChannelFactory = Arc<
    dyn Fn(&ChannelDescriptor, &FactoryContext) -> std::result::Result<Box<dyn SentenceSource>, ContractError>
        + Send
        + Sync,
>;

/// Forwarder factories spawn their own `ForwarderHandle`
pub type ForwarderFactory = Arc<
    dyn Fn(&ForwarderDescriptor, &FactoryContext) -> std::result::Result<ForwarderHandle, ContractError>
        + Send
        + Sync,
>;

pub type ComputerFactory = Arc<
    dyn Fn(&ComputerDescriptor, &FactoryContext) -> std::result::Result<Arc<dyn Computer>, ContractError>
        + Send
        + Sync,
>;

#[derive(Default, Clone)]
pub struct FactoryRegistry {
    channels: HashMap<String, ChannelFactory>,
    forwarders: HashMap<String, ForwarderFactory>,
    computers: HashMap<String, ComputerFactory>,
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .field("forwarders", &self.forwarders.keys().collect::<Vec<_>>())
            .field("computers", &self.computers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_channel<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ChannelDescriptor, &FactoryContext) -> std::result::Result<Box<dyn SentenceSource>, ContractError>
            + Send
            + Sync
            + 'static,
    {
        self.channels.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn register_forwarder<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ForwarderDescriptor, &FactoryContext) -> std::result::Result<ForwarderHandle, ContractError>
            + Send
            + Sync
            + 'static,
    {
        self.forwarders.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn register_computer<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ComputerDescriptor, &FactoryContext) -> std::result::Result<Arc<dyn Computer>, ContractError>
            + Send
            + Sync
            + 'static,
    {
        self.computers.insert(name.into(), Arc::new(factory));
        self
    }

    pub(crate) fn build_channel(
        &self,
        descriptor: &ChannelDescriptor,
        context: &FactoryContext,
    ) -> Result<Box<dyn SentenceSource>> {
        let ChannelKind::Custom { factory, .. } = &descriptor.kind else {
            return Err(RegistryError::config("channel", "not a custom descriptor"));
        };
        let build = self
            .channels
            .get(factory)
            .ok_or_else(|| unknown_factory("channel", factory))?;
        build(descriptor, context)
            .map_err(|e| RegistryError::instantiation(descriptor.identity(), e.to_string()))
    }

    pub(crate) fn build_forwarder(
        &self,
        descriptor: &ForwarderDescriptor,
        context: &FactoryContext,
    ) -> Result<ForwarderHandle> {
        let ForwarderKind::Custom { factory, .. } = &descriptor.kind else {
            return Err(RegistryError::config("forwarder", "not a custom descriptor"));
        };
        let build = self
            .forwarders
            .get(factory)
            .ok_or_else(|| unknown_factory("forwarder", factory))?;
        build(descriptor, context)
            .map_err(|e| RegistryError::instantiation(descriptor.identity(), e.to_string()))
    }

    pub(crate) fn build_computer(
        &self,
        descriptor: &ComputerDescriptor,
        context: &FactoryContext,
    ) -> Result<Arc<dyn Computer>> {
        let ComputerKind::Custom { factory, .. } = &descriptor.kind else {
            return Err(RegistryError::config("computer", "not a custom descriptor"));
        };
        let build = self
            .computers
            .get(factory)
            .ok_or_else(|| unknown_factory("computer", factory))?;
        build(descriptor, context)
            .map_err(|e| RegistryError::instantiation(descriptor.identity(), e.to_string()))
    }
}

fn unknown_factory(collection: &'static str, name: &str) -> RegistryError {
    RegistryError::config(collection, format!("no factory registered as '{name}'"))
}
