//! Time-bounded sample windows averaged into current definitions.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use contracts::CurrentDefinition;
use telemetry_cache::stats::{circular_mean, mean};
use telemetry_cache::TelemetryCache;

use crate::ComputerError;

/// One current observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSample {
    pub at: DateTime<Utc>,
    /// Knots
    pub speed: f64,
    /// Degrees true, 0..360
    pub direction: f64,
}

#[derive(Debug)]
struct TimeWindow {
    length_ms: u64,
    samples: VecDeque<CurrentSample>,
}

impl TimeWindow {
    fn push(&mut self, sample: CurrentSample) {
        self.samples.push_back(sample);
        let newest = self
            .samples
            .iter()
            .map(|s| s.at)
            .max()
            .unwrap_or(sample.at);
        // A horizon before the representable range keeps every sample
        let horizon = i64::try_from(self.length_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .and_then(|length| newest.checked_sub_signed(length));
        if let Some(horizon) = horizon {
            self.samples.retain(|s| s.at >= horizon);
        }
    }

    fn definition(&self) -> CurrentDefinition {
        let oldest = self.samples.iter().map(|s| s.at).min();
        let latest = self.samples.iter().map(|s| s.at).max();
        let len_ms = match (oldest, latest) {
            (Some(oldest), Some(latest)) => (latest - oldest).num_milliseconds(),
            _ => 0,
        };
        CurrentDefinition {
            buffer_length_ms: self.length_ms,
            speed: mean(self.samples.iter().map(|s| s.speed)).unwrap_or(0.0),
            direction: circular_mean(self.samples.iter().map(|s| s.direction))
                .map(|d| d.rem_euclid(360.0))
                .unwrap_or(0.0),
            nb_points: self.samples.len(),
            oldest,
            latest,
            len_ms,
        }
    }
}

/// N independent windows fed with the same samples.
///
/// Each window keeps the samples no older than its length, measured from the
/// newest sample it holds.
#[derive(Debug)]
pub struct WindowedComputer {
    windows: Vec<TimeWindow>,
}

impl WindowedComputer {
    /// Window lengths in milliseconds; they must be non-empty, positive and distinct
    pub fn new<I>(lengths: I) -> Result<Self, ComputerError>
    where
        I: IntoIterator<Item = u64>,
    {
        let lengths: Vec<u64> = lengths.into_iter().collect();
        if lengths.is_empty() {
            return Err(ComputerError::Empty);
        }
        let mut seen = BTreeSet::new();
        for &length_ms in &lengths {
            if length_ms == 0 {
                return Err(ComputerError::InvalidWindow { length_ms });
            }
            if !seen.insert(length_ms) {
                return Err(ComputerError::DuplicateWindow { length_ms });
            }
        }

        Ok(Self {
            windows: lengths
                .into_iter()
                .map(|length_ms| TimeWindow {
                    length_ms,
                    samples: VecDeque::new(),
                })
                .collect(),
        })
    }

    /// Configured lengths, in configuration order
    pub fn lengths(&self) -> Vec<u64> {
        self.windows.iter().map(|w| w.length_ms).collect()
    }

    pub fn shortest(&self) -> Option<u64> {
        self.windows.iter().map(|w| w.length_ms).min()
    }

    /// Append to every window, evicting what fell out of it
    pub fn sample(&mut self, at: DateTime<Utc>, speed: f64, direction: f64) {
        let sample = CurrentSample {
            at,
            speed,
            direction,
        };
        for window in &mut self.windows {
            window.push(sample);
        }
    }

    /// Samples currently held by the window of `length_ms`
    pub fn len_of(&self, length_ms: u64) -> Option<usize> {
        self.windows
            .iter()
            .find(|w| w.length_ms == length_ms)
            .map(|w| w.samples.len())
    }

    pub fn definitions(&self) -> Vec<CurrentDefinition> {
        self.windows.iter().map(TimeWindow::definition).collect()
    }

    /// Write every non-empty window into the calculated-current map
    pub fn publish(&self, cache: &TelemetryCache) -> Vec<CurrentDefinition> {
        let definitions: Vec<CurrentDefinition> = self
            .definitions()
            .into_iter()
            .filter(|d| d.nb_points > 0)
            .collect();
        for definition in &definitions {
            metrics::gauge!(
                "current_speed_knots",
                "window_ms" => definition.buffer_length_ms.to_string()
            )
            .set(definition.speed);
            cache.put_current(definition.clone());
        }
        definitions
    }

    /// Drop every sample, keep the window set
    pub fn reset(&mut self) {
        for window in &mut self.windows {
            window.samples.clear();
        }
    }
}
