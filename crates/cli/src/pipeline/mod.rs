//! Multiplexer orchestration.

mod orchestrator;
mod stats;

pub use orchestrator::{Mux, MuxRunConfig};
pub use stats::RunStats;
