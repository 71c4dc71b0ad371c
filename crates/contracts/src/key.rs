//! MeasurementKey - the closed set of cache keys
//!
//! Each key serializes as its display name, so a cache snapshot reads the same
//! way the instruments label their values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! measurement_keys {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Identifier of one cached measurement
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum MeasurementKey {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl MeasurementKey {
            /// Every key, in declaration order
            pub const ALL: &'static [MeasurementKey] = &[$(MeasurementKey::$variant),+];

            /// Display name used in snapshots and logs
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(MeasurementKey::$variant => $name,)+
                }
            }
        }

        impl FromStr for MeasurementKey {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(MeasurementKey::$variant),)+
                    other => Err(format!("unknown measurement key '{other}'")),
                }
            }
        }
    };
}

measurement_keys! {
    LastSentence => "NMEA",
    Position => "Position",
    GpsDateTime => "GPS Date & Time",
    GpsTime => "GPS Time",
    SolarTime => "Solar Time",
    Altitude => "Altitude",
    Cog => "COG",
    Sog => "SOG",
    Declination => "D",
    Bsp => "BSP",
    Log => "Log",
    DailyLog => "Daily",
    WaterTemperature => "Water Temperature",
    AirTemperature => "Air Temperature",
    BarometricPressure => "Barometric Pressure",
    RelativeHumidity => "Relative Humidity",
    Awa => "AWA",
    Aws => "AWS",
    HdgCompass => "HDG c.",
    HdgMagnetic => "HDG mag.",
    HdgTrue => "HDG true",
    Deviation => "d",
    Variation => "W",
    Twa => "TWA",
    Tws => "TWS",
    Twd => "TWD",
    Csp => "CSP",
    Cdr => "CDR",
    Xte => "XTE",
    FromWaypoint => "From Waypoint",
    ToWaypoint => "To Waypoint",
    WaypointPosition => "WayPoint pos",
    Depth => "Depth",
    DistanceToWaypoint => "Distance to WP",
    BearingToWaypoint => "Bearing to WP",
    SpeedToWaypoint => "Speed to WP",
    Steer => "Steer",
    Leeway => "Leeway",
    Cmg => "CMG",
    SatellitesInView => "Satellites in view",
    BatteryVoltage => "Battery Voltage",
    CalculatedCurrent => "Current calculated with damping",
    SetAndDrift => "Set and Drift",
    BspFactor => "BSP Factor",
    AwsFactor => "AWS Factor",
    AwaOffset => "AWA Offset",
    HdgOffset => "HDG Offset",
    MaxLeeway => "Max Leeway",
    DeviationFile => "Deviation file name",
    DefaultDeclination => "Default Declination",
    Damping => "Damping",
    TimeRunning => "Time Running",
    VmgOnWind => "VMG on Wind",
    VmgToWaypoint => "VMG to Waypoint",
}

impl MeasurementKey {
    /// Calibration and configuration keys that survive a cache reset
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            MeasurementKey::BspFactor
                | MeasurementKey::AwsFactor
                | MeasurementKey::AwaOffset
                | MeasurementKey::HdgOffset
                | MeasurementKey::MaxLeeway
                | MeasurementKey::DeviationFile
                | MeasurementKey::DefaultDeclination
                | MeasurementKey::Damping
        )
    }

    /// Keys whose reads may be damped through a moving window
    pub fn is_smoothing_eligible(&self) -> bool {
        matches!(
            self,
            MeasurementKey::Bsp
                | MeasurementKey::HdgTrue
                | MeasurementKey::Awa
                | MeasurementKey::Aws
                | MeasurementKey::Twa
                | MeasurementKey::Tws
                | MeasurementKey::Twd
                | MeasurementKey::Csp
                | MeasurementKey::Cdr
                | MeasurementKey::Cog
                | MeasurementKey::Sog
                | MeasurementKey::Leeway
        )
    }
}

impl fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
