//! SentenceDispatcher - decoded sentences into cache writes.
//!
//! Checksum first, then one decode table entry per sentence type. A sentence
//! that writes several measurements goes through a single `put_all`, so
//! readers never see half of it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use contracts::{
    Angle, Measure, MeasurementKey as Key, MeasurementValue as Value, SatelliteInfo,
};
use nmea_codec::{DecodedSentence, FieldDecoder, Nmea0183Decoder, WindReference};
use tracing::{debug, info, trace};

use crate::TelemetryCache;

/// Result of dispatching one sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Checksum missing or wrong; the cache was not touched
    BadChecksum,
    /// Valid but carries nothing the cache tracks
    Ignored,
    /// A required field was missing or unparsable; only the raw sentence was stored
    Malformed,
    /// Number of measurements written, the raw sentence excluded
    Applied(usize),
}

impl DispatchOutcome {
    /// Label for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::BadChecksum => "bad_checksum",
            DispatchOutcome::Ignored => "ignored",
            DispatchOutcome::Malformed => "malformed",
            DispatchOutcome::Applied(_) => "applied",
        }
    }
}

/// Local solar time at longitude `lng` (east positive): four minutes per degree
pub fn solar_time(utc: DateTime<Utc>, lng: f64) -> NaiveDateTime {
    let offset_ms = (lng * 240_000.0).round() as i64;
    (utc + Duration::milliseconds(offset_ms)).naive_utc()
}

/// Decodes validated sentences into the telemetry cache
pub struct SentenceDispatcher<D: FieldDecoder = Nmea0183Decoder> {
    cache: Arc<TelemetryCache>,
    decoder: D,
}

impl SentenceDispatcher {
    pub fn new(cache: Arc<TelemetryCache>) -> Self {
        Self::with_decoder(cache, Nmea0183Decoder)
    }
}

impl<D: FieldDecoder> SentenceDispatcher<D> {
    pub fn with_decoder(cache: Arc<TelemetryCache>, decoder: D) -> Self {
        Self { cache, decoder }
    }

    pub fn cache(&self) -> &Arc<TelemetryCache> {
        &self.cache
    }

    /// Validate, decode and store one sentence
    pub fn dispatch(&self, sentence: &str) -> DispatchOutcome {
        let sentence = sentence.trim_end_matches(['\r', '\n']);
        if !self.decoder.valid_checksum(sentence) {
            trace!(sentence, "bad checksum");
            return DispatchOutcome::BadChecksum;
        }

        self.cache
            .put(Key::LastSentence, Value::Text(sentence.to_string()));

        let decoded = match self.decoder.decode(sentence) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(sentence, error = %e, "sentence not decoded");
                return DispatchOutcome::Malformed;
            }
        };

        let writes = self.measurements(decoded);
        if writes.is_empty() {
            return DispatchOutcome::Ignored;
        }
        let count = writes.len();
        self.cache.put_all(writes);
        DispatchOutcome::Applied(count)
    }

    /// Measurements one decoded sentence contributes
    fn measurements(&self, decoded: DecodedSentence) -> Vec<(Key, Value)> {
        let mut out: Vec<(Key, Value)> = Vec::new();
        match decoded {
            DecodedSentence::Gga(gga) => {
                out.push((Key::Position, gga.position.into()));
                if let Some(at) = gga.time.and_then(|t| self.on_cached_date(t)) {
                    out.push((Key::GpsDateTime, at.into()));
                }
                if let Some(alt) = gga.altitude {
                    out.push((Key::Altitude, Measure::meters(alt).into()));
                }
            }
            DecodedSentence::Rmc(rmc) => {
                let at = rmc.timestamp();
                out.push((Key::Position, rmc.position.into()));
                out.push((Key::Cog, Angle::deg360(rmc.cog).into()));
                out.push((Key::Sog, Measure::knots(rmc.sog).into()));
                if let Some(declination) = rmc.declination {
                    out.push((Key::Declination, Angle::east_west(declination).into()));
                }
                out.push((Key::GpsDateTime, at.into()));
                out.push((Key::GpsTime, at.into()));
                out.push((Key::SolarTime, Value::Solar(solar_time(at, rmc.position.lng))));
            }
            DecodedSentence::Zda(zda) => {
                out.push((Key::GpsDateTime, zda.timestamp.into()));
                out.push((Key::GpsTime, zda.timestamp.into()));
                if let Some(pos) = self.cache.get_with(Key::Position, false).and_then(|v| v.as_position()) {
                    out.push((Key::SolarTime, Value::Solar(solar_time(zda.timestamp, pos.lng))));
                }
            }
            DecodedSentence::Vhw(vhw) => {
                if let Some(bsp) = vhw.speed_knots {
                    out.push((Key::Bsp, Measure::knots(bsp).into()));
                }
                if let Some(hdm) = vhw.heading_magnetic {
                    out.push((Key::HdgCompass, Angle::deg360(hdm).into()));
                }
            }
            DecodedSentence::Vlw(vlw) => {
                if let Some(total) = vlw.total_nm {
                    out.push((Key::Log, Measure::nautical_miles(total).into()));
                }
                if let Some(trip) = vlw.trip_nm {
                    out.push((Key::DailyLog, Measure::nautical_miles(trip).into()));
                }
            }
            DecodedSentence::Mtw(t) => out.push((Key::WaterTemperature, Measure::celsius(t).into())),
            DecodedSentence::Mta(t) => out.push((Key::AirTemperature, Measure::celsius(t).into())),
            DecodedSentence::Mmb(hpa) => {
                out.push((Key::BarometricPressure, Measure::hectopascal(hpa).into()))
            }
            DecodedSentence::Mwv(wind) | DecodedSentence::Vwr(wind) => {
                if wind.reference == WindReference::Apparent {
                    out.push((Key::Aws, Measure::knots(wind.speed_knots).into()));
                    out.push((Key::Awa, Angle::deg180(wind.angle).into()));
                } else {
                    trace!("true wind MWV not cached");
                }
            }
            DecodedSentence::Vdr(current) => out.push((Key::SetAndDrift, Value::SetAndDrift(current))),
            DecodedSentence::Vtg(vtg) => {
                if let Some(cog) = vtg.cog {
                    out.push((Key::Cog, Angle::deg360(cog).into()));
                }
                if let Some(sog) = vtg.sog {
                    out.push((Key::Sog, Measure::knots(sog).into()));
                }
            }
            DecodedSentence::Gll(gll) => {
                out.push((Key::Position, gll.position.into()));
                if let Some(at) = gll.time.and_then(|t| self.on_cached_date(t)) {
                    out.push((Key::GpsTime, at.into()));
                    out.push((Key::SolarTime, Value::Solar(solar_time(at, gll.position.lng))));
                }
            }
            DecodedSentence::Hdm(hdm) => out.push((Key::HdgCompass, Angle::deg360(hdm).into())),
            DecodedSentence::Hdt(hdt) => out.push((Key::HdgTrue, Angle::deg360(hdt).into())),
            DecodedSentence::Hdg(hdg) => {
                out.push((Key::HdgCompass, Angle::deg360(hdg.heading).into()));
                if let Some(dev) = hdg.deviation {
                    out.push((Key::Deviation, Angle::east_west(dev).into()));
                }
                if let Some(var) = hdg.variation {
                    out.push((Key::Variation, Angle::east_west(var).into()));
                }
                // deviation wins over variation
                if let Some(declination) = hdg.deviation.or(hdg.variation) {
                    out.push((Key::Declination, Angle::east_west(declination).into()));
                }
            }
            DecodedSentence::Rmb(rmb) => {
                if let Some(xte) = rmb.xte {
                    out.push((Key::Xte, Measure::nautical_miles(xte).into()));
                }
                if let Some(from) = rmb.origin {
                    out.push((Key::FromWaypoint, Value::Text(from)));
                }
                if let Some(to) = rmb.destination {
                    out.push((Key::ToWaypoint, Value::Text(to)));
                }
                if let Some(pos) = rmb.destination_position {
                    out.push((Key::WaypointPosition, pos.into()));
                }
                if let Some(range) = rmb.range_nm {
                    out.push((Key::DistanceToWaypoint, Measure::nautical_miles(range).into()));
                }
                if let Some(bearing) = rmb.bearing {
                    out.push((Key::BearingToWaypoint, Angle::deg360(bearing).into()));
                }
                if let Some(speed) = rmb.closing_speed {
                    out.push((Key::SpeedToWaypoint, Measure::knots(speed).into()));
                }
                if let Some(steer) = rmb.steer {
                    out.push((Key::Steer, Value::Text(steer.to_string())));
                }
            }
            DecodedSentence::Dbt(depth) | DecodedSentence::Dpt(depth) => {
                out.push((Key::Depth, Measure::meters(depth).into()))
            }
            DecodedSentence::Gsv(gsv) => {
                let mut satellites = if gsv.message_number <= 1 {
                    BTreeMap::new()
                } else {
                    match self.cache.get_with(Key::SatellitesInView, false) {
                        Some(Value::Satellites(map)) => map,
                        _ => BTreeMap::new(),
                    }
                };
                satellites.extend(gsv.satellites.into_iter().map(|s: SatelliteInfo| (s.prn, s)));
                out.push((Key::SatellitesInView, Value::Satellites(satellites)));
            }
            DecodedSentence::Mda(mda) => {
                if let Some(t) = mda.air_temperature {
                    out.push((Key::AirTemperature, Measure::celsius(t).into()));
                }
                if let Some(t) = mda.water_temperature {
                    out.push((Key::WaterTemperature, Measure::celsius(t).into()));
                }
                if let Some(p) = mda.pressure_hpa {
                    out.push((Key::BarometricPressure, Measure::hectopascal(p).into()));
                }
                if let Some(h) = mda.relative_humidity {
                    out.push((Key::RelativeHumidity, Measure::percent(h).into()));
                }
            }
            DecodedSentence::Xdr(readings) => {
                for reading in readings {
                    let Some(value) = reading.value else {
                        continue;
                    };
                    match (reading.kind, reading.unit) {
                        ('H', _) => out.push((Key::RelativeHumidity, Measure::percent(value).into())),
                        ('P', Some('B')) => out.push((
                            Key::BarometricPressure,
                            Measure::hectopascal(value * 1000.0).into(),
                        )),
                        ('P', Some('P')) => out.push((
                            Key::BarometricPressure,
                            Measure::hectopascal(value / 100.0).into(),
                        )),
                        ('U', _) => out.push((Key::BatteryVoltage, Measure::volts(value).into())),
                        (kind, unit) => {
                            debug!(%kind, ?unit, name = ?reading.name, "unmanaged XDR reading")
                        }
                    }
                }
            }
            DecodedSentence::Mwd(mwd) => {
                if let Some(tws) = mwd.speed_knots {
                    out.push((Key::Tws, Measure::knots(tws).into()));
                }
                if let Some(twd) = mwd.direction_true {
                    out.push((Key::Twd, Angle::deg360(twd).into()));
                }
            }
            DecodedSentence::Vwt(wind) => {
                out.push((Key::Tws, Measure::knots(wind.speed_knots).into()));
                out.push((Key::Twa, Angle::deg180(wind.angle).into()));
                if let Some(heading) = self.cache.get_with(Key::HdgTrue, false).and_then(|v| v.as_f64()) {
                    let twd = Angle::deg360(heading + wind.angle);
                    info!(twd = twd.degrees, "true wind direction from VWT");
                }
            }
            DecodedSentence::Bat(volts) => out.push((Key::BatteryVoltage, Measure::volts(volts).into())),
            DecodedSentence::Std(elapsed) => out.push((Key::TimeRunning, Value::Duration(elapsed))),
            DecodedSentence::Unknown(id) => trace!(id, "sentence type not managed"),
        }
        out
    }

    /// Time of day on the cached GPS date; `None` until a date is cached
    fn on_cached_date(&self, time: NaiveTime) -> Option<DateTime<Utc>> {
        let date = self
            .cache
            .get_with(Key::GpsDateTime, false)
            .and_then(|v| v.as_utc())?
            .date_naive();
        Utc.from_local_datetime(&date.and_time(time)).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::GeoPos;
    use nmea_codec::generate::with_checksum;

    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    fn dispatcher() -> SentenceDispatcher {
        SentenceDispatcher::new(Arc::new(TelemetryCache::new()))
    }

    #[test]
    fn test_bad_checksum_leaves_cache_untouched() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(RMC);
        let before = dispatcher.cache().snapshot();

        let corrupted = RMC.replace("*6A", "*6B");
        assert_eq!(dispatcher.dispatch(&corrupted), DispatchOutcome::BadChecksum);
        assert_eq!(dispatcher.cache().snapshot(), before);

        assert_eq!(
            dispatcher.dispatch("$GPRMC,123519,A,4807.038,N"),
            DispatchOutcome::BadChecksum
        );
        assert_eq!(dispatcher.cache().snapshot(), before);
    }

    #[test]
    fn test_rmc_populates_all_keys() {
        let dispatcher = dispatcher();
        assert!(matches!(dispatcher.dispatch(RMC), DispatchOutcome::Applied(7)));

        let cache = dispatcher.cache();
        let pos = cache.get(Key::Position).and_then(|v| v.as_position()).unwrap();
        assert!((pos.lat - 48.1173).abs() < 1e-4);
        assert!((pos.lng - 11.516_666).abs() < 1e-5);
        assert_eq!(cache.get_f64(Key::Sog), Some(22.4));
        assert_eq!(cache.get_f64(Key::Cog), Some(84.4));

        let declination = cache.get(Key::Declination).and_then(|v| v.as_angle()).unwrap();
        assert_eq!(declination.degrees, -3.1);
        assert_eq!(declination.hemisphere(), Some('W'));

        let at = cache.get(Key::GpsDateTime).and_then(|v| v.as_utc()).unwrap();
        assert_eq!(at.to_rfc3339(), "1994-03-23T12:35:19+00:00");

        let Some(Value::Solar(solar)) = cache.get(Key::SolarTime) else {
            panic!("solar time missing");
        };
        assert_eq!(
            (solar - at.naive_utc()).num_milliseconds(),
            (pos.lng * 240_000.0).round() as i64
        );
        assert_eq!(
            cache.get(Key::LastSentence).and_then(|v| v.as_text().map(str::to_string)),
            Some(RMC.to_string())
        );
    }

    #[test]
    fn test_malformed_keeps_previous_values() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(RMC);
        let broken = with_checksum("GPRMC,123520,A,4807.038,N,01131.000,E,,090.0,230394,003.1,W");
        assert_eq!(dispatcher.dispatch(&broken), DispatchOutcome::Malformed);
        assert_eq!(dispatcher.cache().get_f64(Key::Cog), Some(84.4));
        assert_eq!(
            dispatcher.cache().get(Key::LastSentence),
            Some(Value::Text(broken))
        );
    }

    #[test]
    fn test_unknown_type_ignored() {
        let dispatcher = dispatcher();
        let line = with_checksum("GPXYZ,1,2,3");
        assert_eq!(dispatcher.dispatch(&line), DispatchOutcome::Ignored);
        assert!(dispatcher.cache().contains(Key::LastSentence));
    }

    #[test]
    fn test_apparent_wind_folded() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(&with_checksum("IIMWV,300.0,R,12.0,N,A"));
        let awa = dispatcher.cache().get(Key::Awa).and_then(|v| v.as_angle()).unwrap();
        assert_eq!(awa.degrees, -60.0);
        assert_eq!(dispatcher.cache().get_f64(Key::Aws), Some(12.0));

        let before = dispatcher.cache().get(Key::Aws);
        assert_eq!(
            dispatcher.dispatch(&with_checksum("IIMWV,045.0,T,20.0,N,A")),
            DispatchOutcome::Ignored
        );
        assert_eq!(dispatcher.cache().get(Key::Aws), before);
    }

    #[test]
    fn test_zda_solar_time_needs_position() {
        let dispatcher = dispatcher();
        let zda = with_checksum("GPZDA,120000.00,01,06,2024,00,00");
        assert_eq!(dispatcher.dispatch(&zda), DispatchOutcome::Applied(2));
        assert!(!dispatcher.cache().contains(Key::SolarTime));

        dispatcher
            .cache()
            .put(Key::Position, GeoPos::new(0.0, -15.0));
        assert_eq!(dispatcher.dispatch(&zda), DispatchOutcome::Applied(3));
        let Some(Value::Solar(solar)) = dispatcher.cache().get(Key::SolarTime) else {
            panic!("solar time missing");
        };
        assert_eq!(solar.to_string(), "2024-06-01 11:00:00");
    }

    #[test]
    fn test_gsv_pages_merge() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(&with_checksum("GPGSV,2,1,06,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45"));
        dispatcher.dispatch(&with_checksum("GPGSV,2,2,06,15,10,100,30,16,20,200,35"));
        let Some(Value::Satellites(map)) = dispatcher.cache().get(Key::SatellitesInView) else {
            panic!("satellites missing");
        };
        assert_eq!(map.len(), 6);

        dispatcher.dispatch(&with_checksum("GPGSV,1,1,01,07,40,083,46"));
        let Some(Value::Satellites(map)) = dispatcher.cache().get(Key::SatellitesInView) else {
            panic!("satellites missing");
        };
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_xdr_routes_by_type() {
        let dispatcher = dispatcher();
        let line = with_checksum("IIXDR,H,55.0,P,HUM,P,1.0132,B,BARO,U,12.6,V,BAT,C,18.0,C,AIR");
        assert_eq!(dispatcher.dispatch(&line), DispatchOutcome::Applied(3));
        let cache = dispatcher.cache();
        assert_eq!(cache.get_f64(Key::RelativeHumidity), Some(55.0));
        assert!((cache.get_f64(Key::BarometricPressure).unwrap() - 1013.2).abs() < 1e-9);
        assert_eq!(cache.get_f64(Key::BatteryVoltage), Some(12.6));
        assert!(!cache.contains(Key::AirTemperature));
    }

    #[test]
    fn test_hdg_corrections_stored_separately() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(&with_checksum("IIHDG,101.0,2.0,W,3.5,E"));
        let cache = dispatcher.cache();
        assert_eq!(cache.get_f64(Key::HdgCompass), Some(101.0));
        assert_eq!(cache.get_f64(Key::Deviation), Some(-2.0));
        assert_eq!(cache.get_f64(Key::Variation), Some(3.5));
        assert_eq!(cache.get_f64(Key::Declination), Some(-2.0));
    }

    #[test]
    fn test_hdg_declination_precedence() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(&with_checksum("IIHDG,101.0,,,3.5,E"));
        assert_eq!(dispatcher.cache().get_f64(Key::Declination), Some(3.5));

        dispatcher.dispatch(&with_checksum("IIHDG,102.0,1.5,E,,"));
        let cache = dispatcher.cache();
        assert_eq!(cache.get_f64(Key::Declination), Some(1.5));
        assert_eq!(cache.get_f64(Key::Variation), Some(3.5));
    }

    #[test]
    fn test_gga_time_needs_cached_date() {
        let dispatcher = dispatcher();
        let gga = with_checksum("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,");
        dispatcher.dispatch(&gga);
        assert!(!dispatcher.cache().contains(Key::GpsDateTime));

        dispatcher.dispatch(&with_checksum("GPZDA,201530.00,04,07,2002,00,00"));
        dispatcher.dispatch(&gga);
        let at = dispatcher
            .cache()
            .get(Key::GpsDateTime)
            .and_then(|v| v.as_utc())
            .unwrap();
        assert_eq!(at.to_rfc3339(), "2002-07-04T12:35:19+00:00");
    }

    #[test]
    fn test_vwt_does_not_store_direction() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(&with_checksum("IIHDT,090.0,T"));
        dispatcher.dispatch(&with_checksum("IIVWT,045.0,L,15.0,N,,M,,K"));
        let cache = dispatcher.cache();
        assert_eq!(cache.get_f64(Key::Twa), Some(-45.0));
        assert_eq!(cache.get_f64(Key::Tws), Some(15.0));
        assert!(!cache.contains(Key::Twd));
    }

    #[test]
    fn test_solar_time_offset() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(solar_time(utc, 90.0).to_string(), "2024-01-01 18:00:00");
        assert_eq!(solar_time(utc, -180.0).to_string(), "2024-01-01 00:00:00");
    }
}
