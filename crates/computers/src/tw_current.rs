//! `tw-current` computer: true wind and averaged current.
//!
//! Runs after each accepted sentence has reached the cache. Apparent wind
//! sentences produce a true wind; ground track sentences produce a current
//! sample for every window. Both results go back into the cache and out as
//! generated sentences carrying the computer's own talker prefix.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use contracts::{
    Angle, Computer, ComputerDescriptor, ComputerKind, ComputerPatch, ContractError, Lifecycle,
    LifecycleState, Measure, MeasurementKey as Key, SentenceCallback,
};
use nmea_codec::{generate, split, WindReference};
use parking_lot::{Mutex, RwLock};
use telemetry_cache::TelemetryCache;
use tracing::{debug, info, trace};

use crate::true_wind::{current, true_wind};
use crate::{ComputerError, WindowedComputer};

fn check_prefix(prefix: &str) -> Result<(), ComputerError> {
    if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ComputerError::invalid_prefix(
            prefix,
            "must be two alphanumeric characters",
        ))
    }
}

/// True wind and current computer
pub struct TwCurrentComputer {
    cache: Arc<TelemetryCache>,
    emit: SentenceCallback,
    prefix: RwLock<String>,
    windows: Mutex<WindowedComputer>,
    verbose: AtomicBool,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for TwCurrentComputer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwCurrentComputer")
            .field("prefix", &*self.prefix.read())
            .field("windows", &self.windows.lock().lengths())
            .field("state", &self.lifecycle.state())
            .finish()
    }
}

impl TwCurrentComputer {
    /// `emit` receives every generated sentence
    pub fn new(
        prefix: impl Into<String>,
        time_buffer_lengths: &[u64],
        cache: Arc<TelemetryCache>,
        emit: SentenceCallback,
    ) -> Result<Self, ComputerError> {
        let prefix = prefix.into();
        check_prefix(&prefix)?;
        let windows = WindowedComputer::new(time_buffer_lengths.iter().copied())?;
        Ok(Self {
            cache,
            emit,
            prefix: RwLock::new(prefix),
            windows: Mutex::new(windows),
            verbose: AtomicBool::new(false),
            lifecycle: Lifecycle::new(),
        })
    }

    pub fn from_descriptor(
        descriptor: &ComputerDescriptor,
        cache: Arc<TelemetryCache>,
        emit: SentenceCallback,
    ) -> Result<Self, ComputerError> {
        let ComputerKind::TwCurrent {
            prefix,
            time_buffer_lengths,
        } = &descriptor.kind
        else {
            return Err(ComputerError::WrongKind {
                kind: descriptor.kind.tag().to_string(),
            });
        };
        let computer = Self::new(prefix.clone(), time_buffer_lengths, cache, emit)?;
        computer.verbose.store(descriptor.verbose, Ordering::Relaxed);
        Ok(computer)
    }

    pub fn prefix(&self) -> String {
        self.prefix.read().clone()
    }

    fn verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    fn f64(&self, key: Key) -> Option<f64> {
        self.cache.get_f64(key)
    }

    /// Raw calibration value, with its neutral default
    fn calibration(&self, key: Key, neutral: f64) -> f64 {
        self.cache
            .get_with(key, false)
            .and_then(|v| v.as_f64())
            .unwrap_or(neutral)
    }

    /// True heading, else compass corrected by deviation and declination
    fn true_heading(&self) -> Option<f64> {
        let offset = self.calibration(Key::HdgOffset, 0.0);
        if let Some(hdt) = self.f64(Key::HdgTrue) {
            return Some(hdt + offset);
        }
        let compass = self.f64(Key::HdgCompass)?;
        let declination = self
            .f64(Key::Declination)
            .or_else(|| self.f64(Key::DefaultDeclination))
            .unwrap_or(0.0);
        let deviation = self.f64(Key::Deviation).unwrap_or(0.0);
        Some(compass + deviation + declination + offset)
    }

    fn water_speed(&self) -> Option<f64> {
        self.f64(Key::Bsp)
            .map(|bsp| bsp * self.calibration(Key::BspFactor, 1.0))
    }

    fn compute_true_wind(&self, prefix: &str) {
        let (Some(aws), Some(awa), Some(bsp), Some(heading)) = (
            self.f64(Key::Aws),
            self.f64(Key::Awa),
            self.water_speed(),
            self.true_heading(),
        ) else {
            trace!("true wind inputs incomplete");
            return;
        };
        let aws = aws * self.calibration(Key::AwsFactor, 1.0);
        let awa = awa + self.calibration(Key::AwaOffset, 0.0);

        let tw = true_wind(aws, awa, bsp, heading);
        self.cache.put_all([
            (Key::Tws, Measure::knots(tw.speed).into()),
            (Key::Twa, Angle::deg180(tw.angle).into()),
            (Key::Twd, Angle::deg360(tw.direction).into()),
        ]);
        if self.verbose() {
            info!(tws = tw.speed, twa = tw.angle, twd = tw.direction, "true wind");
        }
        (self.emit)(generate::mwv(prefix, tw.angle, tw.speed, WindReference::True));
    }

    fn compute_current(&self, prefix: &str) {
        let (Some(cog), Some(sog), Some(bsp), Some(heading)) = (
            self.f64(Key::Cog),
            self.f64(Key::Sog),
            self.water_speed(),
            self.true_heading(),
        ) else {
            trace!("current inputs incomplete");
            return;
        };
        let at = self
            .cache
            .get_with(Key::GpsDateTime, false)
            .and_then(|v| v.as_utc())
            .unwrap_or_else(Utc::now);
        let vector = current(cog, sog, heading, bsp);

        let shortest = {
            let mut windows = self.windows.lock();
            windows.sample(at, vector.drift, vector.set);
            let published = windows.publish(&self.cache);
            let shortest = windows.shortest();
            published
                .into_iter()
                .find(|d| Some(d.buffer_length_ms) == shortest)
        };

        if let Some(definition) = shortest {
            if self.verbose() {
                info!(
                    window_ms = definition.buffer_length_ms,
                    speed = definition.speed,
                    direction = definition.direction,
                    points = definition.nb_points,
                    "current"
                );
            }
            (self.emit)(generate::vdr(prefix, definition.direction, definition.speed));
        }
    }
}

impl Computer for TwCurrentComputer {
    fn descriptor(&self) -> ComputerDescriptor {
        let mut descriptor = ComputerDescriptor::new(ComputerKind::TwCurrent {
            prefix: self.prefix(),
            time_buffer_lengths: self.windows.lock().lengths(),
        });
        descriptor.verbose = self.verbose();
        descriptor
    }

    fn start(&self) {
        if self.lifecycle.start() {
            debug!(prefix = %self.prefix(), "tw-current computer started");
        }
    }

    fn stop(&self) {
        if self.lifecycle.stop() {
            debug!("tw-current computer stopped");
        }
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn on_sentence(&self, sentence: &str) {
        if !self.lifecycle.is_running() {
            return;
        }
        let Ok(raw) = split(sentence) else {
            return;
        };
        let prefix = self.prefix();
        if raw.talker == prefix {
            return;
        }
        match raw.id {
            "MWV" | "VWR" => self.compute_true_wind(&prefix),
            "RMC" | "VTG" => self.compute_current(&prefix),
            _ => {}
        }
    }

    fn reset(&self) {
        self.windows.lock().reset();
    }

    fn update(&self, patch: &ComputerPatch) -> Result<(), ContractError> {
        if let Some(prefix) = &patch.prefix {
            check_prefix(prefix)?;
            *self.prefix.write() = prefix.clone();
        }
        if let Some(verbose) = patch.verbose {
            self.verbose.store(verbose, Ordering::Relaxed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmea_codec::generate::with_checksum;
    use nmea_codec::valid_checksum;
    use telemetry_cache::SentenceDispatcher;

    struct Harness {
        dispatcher: SentenceDispatcher,
        computer: TwCurrentComputer,
        emitted: Arc<Mutex<Vec<String>>>,
    }

    impl Harness {
        fn new(lengths: &[u64]) -> Self {
            let cache = Arc::new(TelemetryCache::new());
            let emitted = Arc::new(Mutex::new(Vec::new()));
            let sink = emitted.clone();
            let computer = TwCurrentComputer::new(
                "CC",
                lengths,
                cache.clone(),
                Arc::new(move |line| sink.lock().push(line)),
            )
            .unwrap();
            computer.start();
            Self {
                dispatcher: SentenceDispatcher::new(cache),
                computer,
                emitted,
            }
        }

        fn feed(&self, body: &str) {
            let line = with_checksum(body);
            self.dispatcher.dispatch(&line);
            self.computer.on_sentence(&line);
        }

        fn cache(&self) -> &TelemetryCache {
            self.dispatcher.cache()
        }
    }

    #[test]
    fn test_true_wind_written_and_emitted() {
        let h = Harness::new(&[10_000]);
        h.feed("IIHDT,000.0,T");
        h.feed("IIVHW,,T,,M,10.0,N,,K");
        h.feed("IIMWV,045.0,R,14.142136,N,A");

        let tws = h.cache().get_f64(Key::Tws).unwrap();
        let twa = h.cache().get_f64(Key::Twa).unwrap();
        assert!((tws - 10.0).abs() < 1e-3);
        assert!((twa - 90.0).abs() < 1e-3);

        let emitted = h.emitted.lock();
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].starts_with("$CCMWV,90.0,T,10.0,N,A*"));
        assert!(valid_checksum(&emitted[0]));
    }

    #[test]
    fn test_current_published_per_window() {
        let h = Harness::new(&[5000, 60_000]);
        h.feed("IIHDT,000.0,T");
        h.feed("IIVHW,,T,,M,5.0,N,,K");
        h.feed("GPRMC,120000,A,4807.038,N,01131.000,E,5.099,011.3,010624,,");

        let map = h.cache().calculated_current();
        assert_eq!(map.len(), 2);
        let def = &map[&5000];
        assert_eq!(def.nb_points, 1);
        assert!((def.speed - 1.0).abs() < 0.01, "got {}", def.speed);
        assert!((def.direction - 90.0).abs() < 1.0, "got {}", def.direction);

        let emitted = h.emitted.lock();
        assert!(emitted.iter().any(|l| l.starts_with("$CCVDR,")));
    }

    #[test]
    fn test_own_prefix_ignored_and_stopped_is_silent() {
        let h = Harness::new(&[10_000]);
        h.feed("IIHDT,000.0,T");
        h.feed("IIVHW,,T,,M,10.0,N,,K");
        h.computer.on_sentence(&with_checksum("CCMWV,045.0,R,14.0,N,A"));
        assert!(h.emitted.lock().is_empty());

        h.computer.stop();
        h.feed("IIMWV,045.0,R,14.0,N,A");
        assert!(h.emitted.lock().is_empty());
        assert_eq!(h.computer.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_compass_heading_fallback_uses_declination() {
        let h = Harness::new(&[10_000]);
        h.cache().put(Key::HdgCompass, Angle::deg360(350.0));
        h.cache().put(Key::Declination, Angle::east_west(10.0));
        assert_eq!(h.computer.true_heading(), Some(360.0));
    }

    #[test]
    fn test_reset_and_update() {
        let h = Harness::new(&[5000]);
        h.feed("IIHDT,000.0,T");
        h.feed("IIVHW,,T,,M,5.0,N,,K");
        h.feed("GPRMC,120000,A,4807.038,N,01131.000,E,5.0,000.0,010624,,");
        assert_eq!(h.computer.windows.lock().len_of(5000), Some(1));

        h.computer.reset();
        assert_eq!(h.computer.windows.lock().len_of(5000), Some(0));

        h.computer
            .update(&ComputerPatch {
                verbose: Some(true),
                prefix: Some("XX".into()),
            })
            .unwrap();
        let descriptor = h.computer.descriptor();
        assert!(descriptor.verbose);
        assert!(matches!(
            descriptor.kind,
            ComputerKind::TwCurrent { ref prefix, .. } if prefix == "XX"
        ));
        assert!(h
            .computer
            .update(&ComputerPatch {
                verbose: None,
                prefix: Some("toolong".into()),
            })
            .is_err());
    }

    #[test]
    fn test_duplicate_windows_fail_construction() {
        let cache = Arc::new(TelemetryCache::new());
        let err = TwCurrentComputer::new("CC", &[5000, 15000, 5000], cache, Arc::new(|_| {}))
            .unwrap_err();
        assert_eq!(err, ComputerError::DuplicateWindow { length_ms: 5000 });
    }
}
