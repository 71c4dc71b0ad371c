//! # Registry
//!
//! The live multiplexer: channels in, forwarders and computers out.
//!
//! Responsibilities:
//! - Hold the channel, forwarder and computer sets as copy-on-write snapshots
//! - Add / remove / update entries at runtime, keyed by `Identity`
//! - Route every accepted sentence through the cache dispatcher, then to
//!   forwarders and computers
//! - Resolve `custom` descriptors through registered factories
//! - Expose the administrative operations (`admin::Admin`)

pub mod admin;
mod collection;
mod context;
pub mod error;
mod factory;
mod registry;

pub use admin::{Admin, AdminError};
pub use context::{LastSentence, MuxContext, Volume};
pub use error::{RegistryError, Result};
pub use factory::{
    ChannelFactory, ComputerFactory, FactoryContext, FactoryRegistry, ForwarderFactory,
};
pub use registry::{ChannelRegistry, EntryView, SentenceObserver};
