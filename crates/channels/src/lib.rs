//! # Channels
//!
//! Input side of the multiplexer.
//!
//! Responsibilities:
//! - Build sentence sources (file replay, TCP client, generators)
//! - Wrap each source in a `ChannelHandle` carrying identity, filters and lifecycle
//! - Push raw sentences into the shared bounded feed, dropping when it is full
//!
//! ## Usage Example
//!
//! ```ignore
//! use channels::{build_source, ChannelHandle, SentenceFeed};
//! use contracts::{ChannelDescriptor, ChannelKind};
//!
//! let feed = SentenceFeed::new(1024, DropPolicy::DropNewest);
//! let descriptor = ChannelDescriptor::new(ChannelKind::Tcp { host: "localhost".into(), port: 7001 });
//! let handle = ChannelHandle::new(descriptor.clone(), build_source(&descriptor)?);
//! handle.start(feed.sender());
//!
//! while let Ok(event) = feed.receiver().recv().await {
//!     if handle.accepts(&event.sentence) { /* route */ }
//! }
//! ```

mod config;
mod error;
mod feed;
mod filter;
mod handle;
mod sources;

pub use config::{ChannelMetrics, DropPolicy, MetricsSnapshot};
pub use error::{ChannelError, Result};
pub use feed::{FeedSender, SentenceFeed};
pub use filter::SentenceFilter;
pub use handle::ChannelHandle;
pub use sources::{build_source, FileSource, RandomSource, TcpSource, ZdaSource};
