//! MuxContext - state shared by the registry, dispatcher and computers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use telemetry_cache::TelemetryCache;

/// Start time and processed byte count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Volume {
    pub started: DateTime<Utc>,
    pub nmea_bytes: u64,
}

/// Most recent sentence routed through the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastSentence {
    pub timestamp: DateTime<Utc>,
    pub last_data: String,
}

#[derive(Debug)]
pub struct MuxContext {
    started_at: DateTime<Utc>,
    nmea_bytes: AtomicU64,
    last: RwLock<Option<LastSentence>>,
    cache: Arc<TelemetryCache>,
}

impl MuxContext {
    pub fn new(cache: Arc<TelemetryCache>) -> Self {
        Self {
            started_at: Utc::now(),
            nmea_bytes: AtomicU64::new(0),
            last: RwLock::new(None),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<TelemetryCache> {
        &self.cache
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn record(&self, sentence: &str, at: DateTime<Utc>) {
        self.nmea_bytes
            .fetch_add(sentence.len() as u64, Ordering::Relaxed);
        metrics::counter!("nmea_bytes_total").increment(sentence.len() as u64);
        *self.last.write() = Some(LastSentence {
            timestamp: at,
            last_data: sentence.to_string(),
        });
    }

    pub fn volume(&self) -> Volume {
        Volume {
            started: self.started_at,
            nmea_bytes: self.nmea_bytes.load(Ordering::Relaxed),
        }
    }

    pub fn last_sentence(&self) -> Option<LastSentence> {
        self.last.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_bytes() {
        let context = MuxContext::new(Arc::new(TelemetryCache::new()));
        assert!(context.last_sentence().is_none());

        let at = Utc::now();
        context.record("$IIHDT,234.5,T*2D", at);
        context.record("$GPZDA,1*00", at);

        assert_eq!(context.volume().nmea_bytes, 17 + 11);
        let last = context.last_sentence().unwrap();
        assert_eq!(last.last_data, "$GPZDA,1*00");
        assert_eq!(last.timestamp, at);
    }
}
