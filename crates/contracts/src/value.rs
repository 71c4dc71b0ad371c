//! Measurement values stored in the telemetry cache.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared range of a circular quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleKind {
    /// 0 <= a < 360
    Deg360,
    /// -180 < a <= 180
    Deg180,
    /// -180 < a <= 180, east positive, rendered with a hemisphere letter
    Deg180Ew,
}

impl AngleKind {
    /// Fold `degrees` into this kind's range
    pub fn normalize(self, degrees: f64) -> f64 {
        let mut folded = degrees.rem_euclid(360.0);
        if folded >= 360.0 {
            folded = 0.0;
        }
        match self {
            AngleKind::Deg360 => folded,
            AngleKind::Deg180 | AngleKind::Deg180Ew => {
                if folded > 180.0 {
                    folded - 360.0
                } else {
                    folded
                }
            }
        }
    }
}

/// Bounded circular angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Angle {
    pub kind: AngleKind,
    pub degrees: f64,
}

impl Angle {
    pub fn new(kind: AngleKind, degrees: f64) -> Self {
        Self {
            kind,
            degrees: kind.normalize(degrees),
        }
    }

    pub fn deg360(degrees: f64) -> Self {
        Self::new(AngleKind::Deg360, degrees)
    }

    pub fn deg180(degrees: f64) -> Self {
        Self::new(AngleKind::Deg180, degrees)
    }

    /// East positive, west negative
    pub fn east_west(degrees: f64) -> Self {
        Self::new(AngleKind::Deg180Ew, degrees)
    }

    /// `E` or `W` for hemisphere angles, `None` otherwise
    pub fn hemisphere(&self) -> Option<char> {
        match self.kind {
            AngleKind::Deg180Ew if self.degrees < 0.0 => Some('W'),
            AngleKind::Deg180Ew => Some('E'),
            _ => None,
        }
    }
}

/// Unit attached to a linear scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Knots,
    NauticalMiles,
    Celsius,
    Hectopascal,
    Meters,
    Volts,
    Percent,
}

/// Unit-tagged scalar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub unit: Unit,
    pub value: f64,
}

impl Measure {
    pub fn new(unit: Unit, value: f64) -> Self {
        Self { unit, value }
    }

    pub fn knots(value: f64) -> Self {
        Self::new(Unit::Knots, value)
    }

    pub fn nautical_miles(value: f64) -> Self {
        Self::new(Unit::NauticalMiles, value)
    }

    pub fn celsius(value: f64) -> Self {
        Self::new(Unit::Celsius, value)
    }

    pub fn hectopascal(value: f64) -> Self {
        Self::new(Unit::Hectopascal, value)
    }

    pub fn meters(value: f64) -> Self {
        Self::new(Unit::Meters, value)
    }

    pub fn volts(value: f64) -> Self {
        Self::new(Unit::Volts, value)
    }

    pub fn percent(value: f64) -> Self {
        Self::new(Unit::Percent, value)
    }
}

/// Geographic position, signed decimal degrees (north and east positive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPos {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPos {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One satellite of a satellites-in-view report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteInfo {
    pub prn: u32,
    pub elevation: Option<u16>,
    pub azimuth: Option<u16>,
    pub snr: Option<u16>,
}

/// Water current as set (direction, degrees true) and drift (knots)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentVector {
    pub set: f64,
    pub drift: f64,
}

/// Current averaged over one time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentDefinition {
    /// Configured window length
    pub buffer_length_ms: u64,
    /// Averaged speed (knots)
    pub speed: f64,
    /// Averaged direction, 0..360
    pub direction: f64,
    /// Samples currently in the window
    pub nb_points: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    /// Observed span between oldest and latest
    pub len_ms: i64,
}

/// Tagged measurement value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MeasurementValue {
    Scalar(f64),
    Angle(Angle),
    Measure(Measure),
    Position(GeoPos),
    Text(String),
    SetAndDrift(CurrentVector),
    Satellites(BTreeMap<u32, SatelliteInfo>),
    Utc(DateTime<Utc>),
    Solar(NaiveDateTime),
    /// Elapsed milliseconds
    Duration(u64),
    CurrentMap(BTreeMap<u64, CurrentDefinition>),
}

impl MeasurementValue {
    /// Numeric payload of scalar, angle and unit values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MeasurementValue::Scalar(v) => Some(*v),
            MeasurementValue::Angle(a) => Some(a.degrees),
            MeasurementValue::Measure(m) => Some(m.value),
            _ => None,
        }
    }

    pub fn as_angle(&self) -> Option<Angle> {
        match self {
            MeasurementValue::Angle(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<GeoPos> {
        match self {
            MeasurementValue::Position(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            MeasurementValue::Utc(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MeasurementValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether a moving average is meaningful for this value
    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

impl From<Angle> for MeasurementValue {
    fn from(angle: Angle) -> Self {
        MeasurementValue::Angle(angle)
    }
}

impl From<Measure> for MeasurementValue {
    fn from(measure: Measure) -> Self {
        MeasurementValue::Measure(measure)
    }
}

impl From<GeoPos> for MeasurementValue {
    fn from(pos: GeoPos) -> Self {
        MeasurementValue::Position(pos)
    }
}

impl From<DateTime<Utc>> for MeasurementValue {
    fn from(at: DateTime<Utc>) -> Self {
        MeasurementValue::Utc(at)
    }
}
