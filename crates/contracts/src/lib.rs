//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the multiplexer:
//! measurement keys and values, component descriptors, identities,
//! lifecycle, the source/forwarder/computer traits and the configuration model.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Wall-clock and GPS timestamps are `chrono::DateTime<Utc>`
//! - Window lengths and elapsed durations are milliseconds (`u64`)

mod computer;
mod config;
mod descriptor;
mod error;
mod forwarder;
mod identity;
mod key;
mod lifecycle;
mod sentence;
mod value;

pub use computer::Computer;
pub use config::*;
pub use descriptor::*;
pub use error::*;
pub use forwarder::*;
pub use identity::Identity;
pub use key::MeasurementKey;
pub use lifecycle::{Lifecycle, LifecycleState};
pub use sentence::*;
pub use value::*;
