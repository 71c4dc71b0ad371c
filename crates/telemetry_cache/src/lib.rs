//! # Telemetry Cache
//!
//! Shared store of the latest measurement values with optional moving-window
//! damping, plus the sentence dispatcher that feeds it.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use telemetry_cache::{SentenceDispatcher, TelemetryCache};
//!
//! let cache = Arc::new(TelemetryCache::with_damping(5));
//! let dispatcher = SentenceDispatcher::new(cache.clone());
//!
//! dispatcher.dispatch("$IIHDT,234.5,T*2D");
//! let heading = cache.get(MeasurementKey::HdgTrue);
//! ```

mod cache;
mod damping;
mod dispatch;
pub mod stats;

pub use cache::{CacheSnapshot, TelemetryCache};
pub use damping::DampingBuffer;
pub use dispatch::{solar_time, DispatchOutcome, SentenceDispatcher};
