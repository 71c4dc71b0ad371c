//! Administrative operations over a running registry.
//!
//! Each operation returns plain serializable data, or an `AdminError`
//! carrying an HTTP-like status, so that any request/response surface can
//! sit on top without knowing the registry's error types.

use std::sync::Arc;

use contracts::{
    ChannelDescriptor, ChannelPatch, ComputerDescriptor, ComputerPatch, ForwarderDescriptor,
    ForwarderPatch, Identity,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::context::{LastSentence, Volume};
use crate::error::RegistryError;
use crate::registry::{ChannelRegistry, EntryView};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{status}: {message}")]
pub struct AdminError {
    pub status: u16,
    pub message: String,
}

impl AdminError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }
}

impl From<RegistryError> for AdminError {
    fn from(err: RegistryError) -> Self {
        Self {
            status: err.status_code(),
            message: err.to_string(),
        }
    }
}

pub type AdminResult<T> = std::result::Result<T, AdminError>;

/// Parse a JSON request body (descriptor, patch or identity string)
pub fn parse_body<T: DeserializeOwned>(body: &str) -> AdminResult<T> {
    serde_json::from_str(body).map_err(|e| AdminError::bad_request(e.to_string()))
}

/// Parse a `kind:key` identity from a request path
pub fn parse_identity(raw: &str) -> AdminResult<Identity> {
    raw.parse()
        .map_err(|_| AdminError::bad_request(format!("invalid identity '{raw}'")))
}

#[derive(Debug, Clone)]
pub struct Admin {
    registry: Arc<ChannelRegistry>,
}

impl Admin {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// Raw cache values plus the calculated-current map
    pub fn cache_snapshot(&self) -> AdminResult<serde_json::Value> {
        let cache = self.registry.cache();
        let values = serde_json::to_value(cache.snapshot()).map_err(internal)?;
        let current = serde_json::to_value(cache.calculated_current()).map_err(internal)?;
        Ok(serde_json::json!({
            "values": values,
            "calculated_current": current,
        }))
    }

    pub fn clear_cache(&self) {
        self.registry.reset_cache();
    }

    pub fn volume(&self) -> Volume {
        self.registry.context().volume()
    }

    pub fn last_sentence(&self) -> Option<LastSentence> {
        self.registry.context().last_sentence()
    }

    pub fn channels(&self) -> Vec<EntryView<ChannelDescriptor>> {
        self.registry.channels()
    }

    pub fn forwarders(&self) -> Vec<EntryView<ForwarderDescriptor>> {
        self.registry.forwarders()
    }

    pub fn computers(&self) -> Vec<EntryView<ComputerDescriptor>> {
        self.registry.computers()
    }

    pub async fn add_channel(&self, descriptor: ChannelDescriptor) -> AdminResult<Identity> {
        Ok(self.registry.add_channel(descriptor).await?)
    }

    pub async fn remove_channel(&self, identity: &Identity) -> AdminResult<ChannelDescriptor> {
        Ok(self.registry.remove_channel(identity).await?)
    }

    pub async fn update_channel(&self, identity: &Identity, patch: &ChannelPatch) -> AdminResult<()> {
        Ok(self.registry.update_channel(identity, patch).await?)
    }

    pub async fn add_forwarder(&self, descriptor: ForwarderDescriptor) -> AdminResult<Identity> {
        Ok(self.registry.add_forwarder(descriptor).await?)
    }

    pub async fn remove_forwarder(&self, identity: &Identity) -> AdminResult<ForwarderDescriptor> {
        Ok(self.registry.remove_forwarder(identity).await?)
    }

    pub async fn update_forwarder(
        &self,
        identity: &Identity,
        patch: &ForwarderPatch,
    ) -> AdminResult<()> {
        Ok(self.registry.update_forwarder(identity, patch).await?)
    }

    pub async fn add_computer(&self, descriptor: ComputerDescriptor) -> AdminResult<Identity> {
        Ok(self.registry.add_computer(descriptor).await?)
    }

    pub async fn remove_computer(&self, identity: &Identity) -> AdminResult<ComputerDescriptor> {
        Ok(self.registry.remove_computer(identity).await?)
    }

    pub async fn update_computer(
        &self,
        identity: &Identity,
        patch: &ComputerPatch,
    ) -> AdminResult<()> {
        Ok(self.registry.update_computer(identity, patch).await?)
    }
}

fn internal(err: serde_json::Error) -> AdminError {
    AdminError {
        status: 500,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ChannelKind, MeasurementKey, MeasurementValue, MuxSettings};
    use telemetry_cache::TelemetryCache;

    fn admin() -> Admin {
        let cache = Arc::new(TelemetryCache::new());
        Admin::new(Arc::new(ChannelRegistry::new(cache, &MuxSettings::default())))
    }

    #[tokio::test]
    async fn test_channel_admin_round() {
        let admin = admin();
        let descriptor: ChannelDescriptor =
            parse_body(r#"{"kind":"zda","period_ms":60000}"#).unwrap();
        let identity = admin.add_channel(descriptor.clone()).await.unwrap();
        assert_eq!(identity.to_string(), "zda");

        let conflict = admin.add_channel(descriptor).await.unwrap_err();
        assert_eq!(conflict.status, 400);

        let listed = serde_json::to_value(admin.channels()).unwrap();
        assert_eq!(listed[0]["kind"], "zda");
        assert_eq!(listed[0]["state"], "running");

        let patch: ChannelPatch = parse_body(r#"{"verbose":true}"#).unwrap();
        admin.update_channel(&identity, &patch).await.unwrap();
        assert!(admin.channels()[0].descriptor.verbose);

        admin.remove_channel(&identity).await.unwrap();
        let missing = admin.remove_channel(&identity).await.unwrap_err();
        assert_eq!(missing.status, 404);
        assert!(admin.channels().is_empty());
    }

    #[tokio::test]
    async fn test_bad_bodies() {
        let admin = admin();
        assert_eq!(
            parse_body::<ChannelDescriptor>(r#"{"kind":"serial","port":"/dev/ttyUSB0"}"#)
                .unwrap_err()
                .status,
            400
        );
        let invalid = ChannelDescriptor::new(ChannelKind::Tcp {
            host: "".into(),
            port: 7001,
        });
        assert_eq!(admin.add_channel(invalid).await.unwrap_err().status, 400);
        assert!(parse_identity("").is_err());
    }

    #[test]
    fn test_cache_snapshot_and_clear() {
        let admin = admin();
        let cache = admin.registry.cache();
        cache.put(MeasurementKey::BspFactor, MeasurementValue::Scalar(1.05));
        cache.put(MeasurementKey::Sog, MeasurementValue::Scalar(6.2));

        let snapshot = admin.cache_snapshot().unwrap();
        assert!(snapshot["values"].as_object().unwrap().len() >= 2);
        assert!(snapshot["calculated_current"].as_object().unwrap().is_empty());

        admin.clear_cache();
        assert!(!cache.contains(MeasurementKey::Sog));
        assert!(cache.contains(MeasurementKey::BspFactor));
        assert_eq!(admin.volume().nmea_bytes, 0);
        assert!(admin.last_sentence().is_none());
    }
}
