//! Multiplexer run statistics.
//!
//! Prometheus counters are recorded where the events happen (channels,
//! registry, forwarders). This module keeps an in-memory aggregate of the
//! same traffic so that a run can print a summary when it ends.

use std::collections::BTreeMap;

use metrics::{counter, histogram};

/// Origin label for sentences not produced by a channel
pub const LOCAL_ORIGIN: &str = "local";

/// Record one dispatched sentence as Prometheus metrics
pub fn record_sentence(origin: &str, outcome: &str, len: usize) {
    counter!(
        "mux_sentences_total",
        "origin" => origin.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("mux_sentence_length_bytes").record(len as f64);
}

/// Talker + sentence type of a raw sentence, e.g. `GPRMC`
pub fn sentence_address(sentence: &str) -> Option<&str> {
    let body = sentence.strip_prefix(['$', '!'])?;
    let end = body.find([',', '*']).unwrap_or(body.len());
    let address = &body[..end];
    (!address.is_empty()).then_some(address)
}

/// In-memory aggregate of the sentences a run has routed
#[derive(Debug, Clone, Default)]
pub struct MuxStatsAggregator {
    pub total_sentences: u64,

    /// Count per dispatch outcome label
    pub outcomes: BTreeMap<String, u64>,

    /// Count per origin (channel identity or `local`)
    pub origins: BTreeMap<String, u64>,

    /// Count per talker + sentence type
    pub addresses: BTreeMap<String, u64>,

    pub sentence_length: RunningStats,
}

impl MuxStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, origin: Option<&str>, sentence: &str, outcome: &str) {
        self.total_sentences += 1;
        *self.outcomes.entry(outcome.to_string()).or_insert(0) += 1;
        *self
            .origins
            .entry(origin.unwrap_or(LOCAL_ORIGIN).to_string())
            .or_insert(0) += 1;
        if let Some(address) = sentence_address(sentence) {
            *self.addresses.entry(address.to_string()).or_insert(0) += 1;
        }
        self.sentence_length.push(sentence.len() as f64);
    }

    pub fn summary(&self) -> MuxSummary {
        let rejected = self.outcomes.get("bad_checksum").copied().unwrap_or(0);
        MuxSummary {
            total_sentences: self.total_sentences,
            bad_checksum: rejected,
            reject_rate: if self.total_sentences > 0 {
                rejected as f64 / self.total_sentences as f64 * 100.0
            } else {
                0.0
            },
            outcomes: self.outcomes.clone(),
            origins: self.origins.clone(),
            addresses: self.addresses.clone(),
            sentence_length: StatsSummary::from(&self.sentence_length),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct MuxSummary {
    pub total_sentences: u64,
    pub bad_checksum: u64,
    pub reject_rate: f64,
    pub outcomes: BTreeMap<String, u64>,
    pub origins: BTreeMap<String, u64>,
    pub addresses: BTreeMap<String, u64>,
    pub sentence_length: StatsSummary,
}

impl std::fmt::Display for MuxSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Mux Summary ===")?;
        writeln!(f, "Sentences: {}", self.total_sentences)?;
        writeln!(
            f,
            "Bad checksum: {} ({:.2}%)",
            self.bad_checksum, self.reject_rate
        )?;
        writeln!(f, "Sentence length (bytes): {}", self.sentence_length)?;

        for (title, counts) in [
            ("Outcomes", &self.outcomes),
            ("Origins", &self.origins),
            ("Sentence types", &self.addresses),
        ] {
            if counts.is_empty() {
                continue;
            }
            writeln!(f, "{title}:")?;
            for (name, count) in counts {
                writeln!(f, "  {name}: {count}")?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// Online mean / variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
