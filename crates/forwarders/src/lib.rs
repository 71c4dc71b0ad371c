//! # Forwarders
//!
//! Raw sentence outputs.
//!
//! Each forwarder runs behind a `ForwarderHandle`: a bounded queue and a
//! worker task that owns the transport, so a slow output drops its own
//! sentences without stalling the registry.

pub mod error;
pub mod factory;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{Forwarder, ForwarderDescriptor};
pub use error::ForwarderError;
pub use factory::build_forwarder;
pub use handle::{frame_line, ForwarderHandle};
pub use metrics::{ForwarderMetrics, MetricsSnapshot};
pub use sinks::{ConsoleForwarder, FileForwarder, TcpServerForwarder, UdpForwarder};
