//! MuxConfig - Config Loader output
//!
//! Describes a complete multiplexer setup: cache calibration, feed sizing and
//! the initial channels, forwarders and computers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::{ChannelDescriptor, ComputerDescriptor, ForwarderDescriptor};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete multiplexer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MuxConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Cache damping and calibration values
    #[serde(default)]
    pub cache: CacheSettings,

    /// Feed sizing
    #[serde(default)]
    pub mux: MuxSettings,

    #[serde(default)]
    pub channels: Vec<ChannelDescriptor>,

    #[serde(default)]
    pub forwarders: Vec<ForwarderDescriptor>,

    #[serde(default)]
    pub computers: Vec<ComputerDescriptor>,
}

/// Cache settings, written to the protected keys at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CacheSettings {
    /// Damping window size (1 = no smoothing)
    #[serde(default = "default_damping")]
    #[validate(range(min = 1, max = 10000))]
    pub damping: usize,

    /// Declination used when no sentence provides one (degrees, east positive)
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub default_declination: f64,

    #[serde(default = "default_factor")]
    #[validate(range(min = 0.0))]
    pub bsp_factor: f64,

    #[serde(default = "default_factor")]
    #[validate(range(min = 0.0))]
    pub aws_factor: f64,

    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub awa_offset: f64,

    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub hdg_offset: f64,

    #[serde(default = "default_max_leeway")]
    #[validate(range(min = 0.0, max = 90.0))]
    pub max_leeway: f64,

    /// Deviation curve file, recorded for display only
    #[serde(default)]
    pub deviation_file: Option<PathBuf>,
}

fn default_damping() -> usize {
    1
}

fn default_factor() -> f64 {
    1.0
}

fn default_max_leeway() -> f64 {
    10.0
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            default_declination: 0.0,
            bsp_factor: default_factor(),
            aws_factor: default_factor(),
            awa_offset: 0.0,
            hdg_offset: 0.0,
            max_leeway: default_max_leeway(),
            deviation_file: None,
        }
    }
}

/// Sentence feed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MuxSettings {
    /// Capacity of the channel-to-registry feed
    #[serde(default = "default_feed_capacity")]
    #[validate(range(min = 1))]
    pub feed_capacity: usize,
}

fn default_feed_capacity() -> usize {
    1024
}

impl Default for MuxSettings {
    fn default() -> Self {
        Self {
            feed_capacity: default_feed_capacity(),
        }
    }
}
