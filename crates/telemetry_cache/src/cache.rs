//! TelemetryCache - latest value per measurement key.
//!
//! Composition of two maps behind one lock: key -> raw value and
//! key -> damping buffer. Writes take the lock once per call; damped reads
//! copy the window under the lock and average outside it.

use std::collections::{BTreeMap, HashMap};

use contracts::{Angle, CacheSettings, CurrentDefinition, MeasurementKey, MeasurementValue};
use parking_lot::Mutex;
use tracing::debug;

use crate::stats::average;
use crate::DampingBuffer;

/// Serializable copy of every present key
pub type CacheSnapshot = BTreeMap<MeasurementKey, MeasurementValue>;

#[derive(Debug)]
struct CacheState {
    values: HashMap<MeasurementKey, MeasurementValue>,
    damping: HashMap<MeasurementKey, DampingBuffer>,
    damping_size: usize,
}

impl CacheState {
    fn new(damping_size: usize) -> Self {
        let mut state = Self {
            values: HashMap::new(),
            damping: HashMap::new(),
            damping_size: damping_size.max(1),
        };
        state.values.insert(
            MeasurementKey::Damping,
            MeasurementValue::Scalar(state.damping_size as f64),
        );
        state.values.insert(
            MeasurementKey::CalculatedCurrent,
            MeasurementValue::CurrentMap(BTreeMap::new()),
        );
        state
    }

    fn insert(&mut self, key: MeasurementKey, value: MeasurementValue) {
        if self.damping_size > 1 && key.is_smoothing_eligible() && value.is_numeric() {
            let size = self.damping_size;
            self.damping
                .entry(key)
                .or_insert_with(|| DampingBuffer::new(size))
                .push(value.clone());
        }
        self.values.insert(key, value);
    }
}

/// Thread-safe measurement cache
#[derive(Debug)]
pub struct TelemetryCache {
    state: Mutex<CacheState>,
}

impl Default for TelemetryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryCache {
    /// Cache without damping
    pub fn new() -> Self {
        Self::with_damping(1)
    }

    /// Cache damping eligible keys over the last `size` samples
    pub fn with_damping(size: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::new(size)),
        }
    }

    /// Cache seeded with calibration values
    pub fn from_settings(settings: &CacheSettings) -> Self {
        let cache = Self::with_damping(settings.damping);
        let mut calibration = vec![
            (
                MeasurementKey::BspFactor,
                MeasurementValue::Scalar(settings.bsp_factor),
            ),
            (
                MeasurementKey::AwsFactor,
                MeasurementValue::Scalar(settings.aws_factor),
            ),
            (
                MeasurementKey::AwaOffset,
                Angle::deg180(settings.awa_offset).into(),
            ),
            (
                MeasurementKey::HdgOffset,
                Angle::deg180(settings.hdg_offset).into(),
            ),
            (
                MeasurementKey::MaxLeeway,
                MeasurementValue::Scalar(settings.max_leeway),
            ),
            (
                MeasurementKey::DefaultDeclination,
                Angle::east_west(settings.default_declination).into(),
            ),
        ];
        if let Some(path) = &settings.deviation_file {
            calibration.push((
                MeasurementKey::DeviationFile,
                MeasurementValue::Text(path.display().to_string()),
            ));
        }
        cache.put_all(calibration);
        cache
    }

    /// Store a raw value, feeding its damping window when damping is on
    pub fn put(&self, key: MeasurementKey, value: impl Into<MeasurementValue>) {
        self.state.lock().insert(key, value.into());
    }

    /// Store several values under a single lock acquisition
    pub fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (MeasurementKey, MeasurementValue)>,
    {
        let mut state = self.state.lock();
        for (key, value) in entries {
            state.insert(key, value);
        }
    }

    /// Damped read
    pub fn get(&self, key: MeasurementKey) -> Option<MeasurementValue> {
        self.get_with(key, true)
    }

    /// Damped or raw read.
    ///
    /// Falls back to the raw value when the window is empty or the value is
    /// not numeric.
    pub fn get_with(&self, key: MeasurementKey, use_damping: bool) -> Option<MeasurementValue> {
        let (raw, window) = {
            let state = self.state.lock();
            let raw = state.values.get(&key).cloned();
            let window = if use_damping && state.damping_size > 1 {
                state
                    .damping
                    .get(&key)
                    .filter(|buffer| !buffer.is_empty())
                    .map(DampingBuffer::samples)
            } else {
                None
            };
            (raw, window)
        };

        match window {
            Some(samples) => average(&samples).or(raw),
            None => raw,
        }
    }

    /// Damped numeric read
    pub fn get_f64(&self, key: MeasurementKey) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn contains(&self, key: MeasurementKey) -> bool {
        self.state.lock().values.contains_key(&key)
    }

    /// Clear every non-protected key, the damping windows and the current map
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.values.retain(|key, _| key.is_protected());
        state.values.insert(
            MeasurementKey::CalculatedCurrent,
            MeasurementValue::CurrentMap(BTreeMap::new()),
        );
        state.damping.clear();
        debug!(kept = state.values.len(), "cache reset");
    }

    /// Change the damping window; existing windows are discarded
    pub fn set_damping(&self, size: usize) {
        let mut state = self.state.lock();
        state.damping_size = size.max(1);
        state.damping.clear();
        let size = state.damping_size;
        state
            .values
            .insert(MeasurementKey::Damping, MeasurementValue::Scalar(size as f64));
    }

    pub fn damping(&self) -> usize {
        self.state.lock().damping_size
    }

    /// Samples currently held for `key`
    pub fn damping_len(&self, key: MeasurementKey) -> usize {
        self.state
            .lock()
            .damping
            .get(&key)
            .map_or(0, DampingBuffer::len)
    }

    /// Store one window's current in the calculated-current map
    pub fn put_current(&self, definition: CurrentDefinition) {
        let mut state = self.state.lock();
        let entry = state
            .values
            .entry(MeasurementKey::CalculatedCurrent)
            .or_insert_with(|| MeasurementValue::CurrentMap(BTreeMap::new()));
        match entry {
            MeasurementValue::CurrentMap(map) => {
                map.insert(definition.buffer_length_ms, definition);
            }
            other => {
                let mut map = BTreeMap::new();
                map.insert(definition.buffer_length_ms, definition);
                *other = MeasurementValue::CurrentMap(map);
            }
        }
    }

    pub fn calculated_current(&self) -> BTreeMap<u64, CurrentDefinition> {
        match self.state.lock().values.get(&MeasurementKey::CalculatedCurrent) {
            Some(MeasurementValue::CurrentMap(map)) => map.clone(),
            _ => BTreeMap::new(),
        }
    }

    /// Raw copy of the whole cache
    pub fn snapshot(&self) -> CacheSnapshot {
        self.state
            .lock()
            .values
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect()
    }

    /// Copy with damped reads for eligible keys
    pub fn damped_snapshot(&self) -> CacheSnapshot {
        let keys: Vec<MeasurementKey> = self.state.lock().values.keys().copied().collect();
        keys.into_iter()
            .filter_map(|key| self.get(key).map(|value| (key, value)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GeoPos, Measure};

    fn angular_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn test_heading_damping_wraps_north() {
        let cache = TelemetryCache::with_damping(2);
        cache.put(MeasurementKey::HdgTrue, Angle::deg360(350.0));
        cache.put(MeasurementKey::HdgTrue, Angle::deg360(10.0));

        let damped = cache.get_f64(MeasurementKey::HdgTrue).unwrap();
        assert!(angular_distance(damped, 0.0) < 1e-6, "got {damped}");

        let raw = cache
            .get_with(MeasurementKey::HdgTrue, false)
            .and_then(|v| v.as_f64())
            .unwrap();
        assert_eq!(raw, 10.0);
    }

    #[test]
    fn test_linear_damping_window_bounded() {
        let cache = TelemetryCache::with_damping(3);
        for v in [2.0, 4.0, 6.0, 8.0] {
            cache.put(MeasurementKey::Bsp, Measure::knots(v));
        }
        assert_eq!(cache.damping_len(MeasurementKey::Bsp), 3);
        assert_eq!(
            cache.get(MeasurementKey::Bsp),
            Some(MeasurementValue::Measure(Measure::knots(6.0)))
        );
    }

    #[test]
    fn test_raw_read_returns_exact_value() {
        for damping in [1, 5] {
            let cache = TelemetryCache::with_damping(damping);
            cache.put(MeasurementKey::Sog, Measure::knots(3.0));
            let value = MeasurementValue::Measure(Measure::knots(7.25));
            cache.put(MeasurementKey::Sog, value.clone());
            assert_eq!(cache.get_with(MeasurementKey::Sog, false), Some(value));
        }
    }

    #[test]
    fn test_non_eligible_and_composite_bypass_damping() {
        let cache = TelemetryCache::with_damping(4);
        cache.put(MeasurementKey::Depth, Measure::meters(5.0));
        cache.put(MeasurementKey::Depth, Measure::meters(9.0));
        assert_eq!(cache.damping_len(MeasurementKey::Depth), 0);
        assert_eq!(
            cache.get(MeasurementKey::Depth),
            Some(MeasurementValue::Measure(Measure::meters(9.0)))
        );

        let pos = GeoPos::new(37.5, -122.3);
        cache.put(MeasurementKey::Position, pos);
        assert_eq!(cache.get(MeasurementKey::Position), Some(pos.into()));
    }

    #[test]
    fn test_reset_keeps_protected_keys() {
        let cache = TelemetryCache::with_damping(3);
        cache.put(MeasurementKey::BspFactor, MeasurementValue::Scalar(1.08));
        cache.put(MeasurementKey::MaxLeeway, MeasurementValue::Scalar(12.0));
        cache.put(MeasurementKey::Bsp, Measure::knots(5.0));
        cache.put(MeasurementKey::Position, GeoPos::new(1.0, 2.0));
        cache.put_current(CurrentDefinition {
            buffer_length_ms: 10_000,
            speed: 1.0,
            direction: 90.0,
            nb_points: 3,
            oldest: None,
            latest: None,
            len_ms: 0,
        });

        cache.reset();

        assert_eq!(
            cache.get(MeasurementKey::BspFactor),
            Some(MeasurementValue::Scalar(1.08))
        );
        assert_eq!(
            cache.get(MeasurementKey::MaxLeeway),
            Some(MeasurementValue::Scalar(12.0))
        );
        assert_eq!(cache.damping(), 3);
        assert!(!cache.contains(MeasurementKey::Bsp));
        assert!(!cache.contains(MeasurementKey::Position));
        assert_eq!(cache.damping_len(MeasurementKey::Bsp), 0);
        assert!(cache.calculated_current().is_empty());
        assert!(cache.contains(MeasurementKey::CalculatedCurrent));
    }

    #[test]
    fn test_set_damping_discards_windows() {
        let cache = TelemetryCache::with_damping(3);
        cache.put(MeasurementKey::Aws, Measure::knots(10.0));
        cache.set_damping(5);
        assert_eq!(cache.damping_len(MeasurementKey::Aws), 0);
        assert_eq!(
            cache.get_with(MeasurementKey::Damping, false),
            Some(MeasurementValue::Scalar(5.0))
        );
    }

    #[test]
    fn test_from_settings_writes_protected_keys() {
        let settings = CacheSettings {
            damping: 4,
            bsp_factor: 1.1,
            default_declination: -4.0,
            ..Default::default()
        };
        let cache = TelemetryCache::from_settings(&settings);
        assert_eq!(cache.damping(), 4);
        assert_eq!(cache.get_f64(MeasurementKey::BspFactor), Some(1.1));
        let declination = cache
            .get(MeasurementKey::DefaultDeclination)
            .and_then(|v| v.as_angle())
            .unwrap();
        assert_eq!(declination.hemisphere(), Some('W'));
    }

    #[test]
    fn test_snapshot_serializes_with_display_names() {
        let cache = TelemetryCache::new();
        cache.put(MeasurementKey::Sog, Measure::knots(4.0));
        let json = serde_json::to_value(cache.snapshot()).unwrap();
        assert_eq!(json["SOG"]["value"]["value"], 4.0);
        assert!(json.get("Damping").is_some());
    }
}
