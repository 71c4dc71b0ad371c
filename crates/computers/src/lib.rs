//! # Computers
//!
//! Derived quantities computed from the sentence stream.
//!
//! - `WindowedComputer`: independent time windows of current samples, each
//!   averaged into a `CurrentDefinition`
//! - true wind and current vector math
//! - `TwCurrentComputer`: the `tw-current` computer tying both to the cache
//!
//! ## Usage
//!
//! ```ignore
//! use computers::WindowedComputer;
//!
//! let mut windows = WindowedComputer::new([10_000, 60_000])?;
//! windows.sample(at, 1.2, 045.0);
//! windows.publish(&cache);
//! ```

mod error;
pub mod true_wind;
mod tw_current;
mod window;

pub use error::ComputerError;
pub use tw_current::TwCurrentComputer;
pub use window::{CurrentSample, WindowedComputer};
