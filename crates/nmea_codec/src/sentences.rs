//! Typed sentences and their field decoders.
//!
//! Required fields fail the whole sentence; optional fields that are empty
//! or malformed decode as `None`.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use contracts::{CurrentVector, GeoPos, SatelliteInfo};

use crate::fields::{to_knots, Fields};
use crate::DecodeError;

/// GGA - position fix with altitude
#[derive(Debug, Clone, PartialEq)]
pub struct Gga {
    pub time: Option<NaiveTime>,
    pub position: GeoPos,
    pub fix_quality: Option<u32>,
    pub satellites: Option<u32>,
    /// Meters above mean sea level
    pub altitude: Option<f64>,
}

/// RMC - recommended minimum navigation data
#[derive(Debug, Clone, PartialEq)]
pub struct Rmc {
    pub time: NaiveTime,
    pub active: bool,
    pub position: GeoPos,
    pub sog: f64,
    pub cog: f64,
    pub date: NaiveDate,
    /// Magnetic variation, east positive
    pub declination: Option<f64>,
}

impl Rmc {
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(self.time))
    }
}

/// ZDA - UTC date and time
#[derive(Debug, Clone, PartialEq)]
pub struct Zda {
    pub timestamp: DateTime<Utc>,
}

/// VHW - water speed and heading
#[derive(Debug, Clone, PartialEq)]
pub struct Vhw {
    pub heading_true: Option<f64>,
    pub heading_magnetic: Option<f64>,
    pub speed_knots: Option<f64>,
}

/// VLW - distance log
#[derive(Debug, Clone, PartialEq)]
pub struct Vlw {
    pub total_nm: Option<f64>,
    pub trip_nm: Option<f64>,
}

/// Whether a wind angle is measured from the bow or from north/true
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindReference {
    Apparent,
    True,
}

/// MWV / VWR / VWT - wind angle and speed
#[derive(Debug, Clone, PartialEq)]
pub struct Wind {
    /// Degrees relative to the bow, -180..180 (port negative)
    pub angle: f64,
    pub speed_knots: f64,
    pub reference: WindReference,
}

/// VTG - track and ground speed
#[derive(Debug, Clone, PartialEq)]
pub struct Vtg {
    pub cog: Option<f64>,
    pub sog: Option<f64>,
}

/// GLL - position and time without date
#[derive(Debug, Clone, PartialEq)]
pub struct Gll {
    pub position: GeoPos,
    pub time: Option<NaiveTime>,
}

/// HDG - heading with deviation and variation
#[derive(Debug, Clone, PartialEq)]
pub struct Hdg {
    pub heading: f64,
    /// East positive
    pub deviation: Option<f64>,
    /// East positive
    pub variation: Option<f64>,
}

/// RMB - navigation to the active waypoint
#[derive(Debug, Clone, PartialEq)]
pub struct Rmb {
    pub active: bool,
    /// Cross-track error, nautical miles
    pub xte: Option<f64>,
    /// Direction to steer to recover the track, `L` or `R`
    pub steer: Option<char>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub destination_position: Option<GeoPos>,
    pub range_nm: Option<f64>,
    pub bearing: Option<f64>,
    pub closing_speed: Option<f64>,
}

/// GSV - satellites in view, one page of a multi-sentence report
#[derive(Debug, Clone, PartialEq)]
pub struct Gsv {
    pub total_messages: u32,
    pub message_number: u32,
    pub satellites_in_view: Option<u32>,
    pub satellites: Vec<SatelliteInfo>,
}

/// MDA - meteorological composite
#[derive(Debug, Clone, PartialEq)]
pub struct Mda {
    pub pressure_hpa: Option<f64>,
    pub air_temperature: Option<f64>,
    pub water_temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
}

/// One XDR measurement quadruplet
#[derive(Debug, Clone, PartialEq)]
pub struct Transducer {
    /// Transducer type letter (`H` humidity, `P` pressure, `U` voltage, `C` temperature...)
    pub kind: char,
    pub value: Option<f64>,
    pub unit: Option<char>,
    pub name: Option<String>,
}

/// MWD - true wind direction and speed
#[derive(Debug, Clone, PartialEq)]
pub struct Mwd {
    pub direction_true: Option<f64>,
    pub speed_knots: Option<f64>,
}

/// Sentence decoded into typed fields
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedSentence {
    Gga(Gga),
    Rmc(Rmc),
    Zda(Zda),
    Vhw(Vhw),
    Vlw(Vlw),
    /// Water temperature, Celsius
    Mtw(f64),
    /// Air temperature, Celsius
    Mta(f64),
    /// Barometric pressure, hPa
    Mmb(f64),
    Mwv(Wind),
    Vwr(Wind),
    Vdr(CurrentVector),
    Vtg(Vtg),
    Gll(Gll),
    /// Magnetic heading
    Hdm(f64),
    /// True heading
    Hdt(f64),
    Hdg(Hdg),
    Rmb(Rmb),
    /// Depth below transducer, meters
    Dbt(f64),
    /// Depth, meters
    Dpt(f64),
    Gsv(Gsv),
    Mda(Mda),
    Xdr(Vec<Transducer>),
    Mwd(Mwd),
    Vwt(Wind),
    /// Battery voltage
    Bat(f64),
    /// Elapsed running time, milliseconds
    Std(u64),
    /// Id with no decoder
    Unknown(String),
}

impl DecodedSentence {
    pub(crate) fn decode(id: &str, fields: &[&str]) -> Result<Self, DecodeError> {
        Ok(match id {
            "GGA" => DecodedSentence::Gga(gga(&Fields::new("GGA", fields))?),
            "RMC" => DecodedSentence::Rmc(rmc(&Fields::new("RMC", fields))?),
            "ZDA" => DecodedSentence::Zda(zda(&Fields::new("ZDA", fields))?),
            "VHW" => DecodedSentence::Vhw(vhw(&Fields::new("VHW", fields))),
            "VLW" => DecodedSentence::Vlw(vlw(&Fields::new("VLW", fields))?),
            "MTW" => DecodedSentence::Mtw(Fields::new("MTW", fields).required_f64(0, "temperature")?),
            "MTA" => DecodedSentence::Mta(Fields::new("MTA", fields).required_f64(0, "temperature")?),
            "MMB" => DecodedSentence::Mmb(mmb(&Fields::new("MMB", fields))?),
            "MWV" => DecodedSentence::Mwv(mwv(&Fields::new("MWV", fields))?),
            "VWR" => DecodedSentence::Vwr(side_wind(&Fields::new("VWR", fields), WindReference::Apparent)?),
            "VWT" => DecodedSentence::Vwt(side_wind(&Fields::new("VWT", fields), WindReference::True)?),
            "VDR" => DecodedSentence::Vdr(vdr(&Fields::new("VDR", fields))?),
            "VTG" => DecodedSentence::Vtg(vtg(&Fields::new("VTG", fields))?),
            "GLL" => DecodedSentence::Gll(gll(&Fields::new("GLL", fields))?),
            "HDM" => DecodedSentence::Hdm(Fields::new("HDM", fields).required_f64(0, "heading")?),
            "HDT" => DecodedSentence::Hdt(Fields::new("HDT", fields).required_f64(0, "heading")?),
            "HDG" => DecodedSentence::Hdg(hdg(&Fields::new("HDG", fields))?),
            "RMB" => DecodedSentence::Rmb(rmb(&Fields::new("RMB", fields))),
            "DBT" => DecodedSentence::Dbt(dbt(&Fields::new("DBT", fields))?),
            "DPT" => DecodedSentence::Dpt(dpt(&Fields::new("DPT", fields))?),
            "GSV" => DecodedSentence::Gsv(gsv(&Fields::new("GSV", fields))?),
            "MDA" => DecodedSentence::Mda(mda(&Fields::new("MDA", fields))),
            "XDR" => DecodedSentence::Xdr(xdr(&Fields::new("XDR", fields))?),
            "MWD" => DecodedSentence::Mwd(mwd(&Fields::new("MWD", fields))?),
            "BAT" => DecodedSentence::Bat(Fields::new("BAT", fields).required_f64(0, "voltage")?),
            "STD" => DecodedSentence::Std(std_elapsed(&Fields::new("STD", fields))?),
            other => DecodedSentence::Unknown(other.to_string()),
        })
    }
}

// $GPGGA,hhmmss.ss,llll.ll,a,yyyyy.yy,a,q,nn,hdop,alt,M,geoid,M,age,station
fn gga(f: &Fields) -> Result<Gga, DecodeError> {
    let lat = f.coordinate(1, "latitude")?;
    let lng = f.coordinate(3, "longitude")?;
    Ok(Gga {
        time: f.time(0, "time").ok(),
        position: GeoPos::new(lat, lng),
        fix_quality: f.u32(5),
        satellites: f.u32(6),
        altitude: f.f64(8),
    })
}

// $GPRMC,hhmmss,A,llll.ll,a,yyyyy.yy,a,sog,cog,ddmmyy,var,E/W
fn rmc(f: &Fields) -> Result<Rmc, DecodeError> {
    let time = f.time(0, "time")?;
    let active = f.char(1) == Some('A');
    let lat = f.coordinate(2, "latitude")?;
    let lng = f.coordinate(4, "longitude")?;
    let sog = f.required_f64(6, "sog")?;
    let cog = f.required_f64(7, "cog")?;
    let date = f.date(8, "date")?;
    let declination = match (f.f64(9), f.char(10)) {
        (Some(v), Some('W')) => Some(-v),
        (Some(v), Some('E')) => Some(v),
        _ => None,
    };
    Ok(Rmc {
        time,
        active,
        position: GeoPos::new(lat, lng),
        sog,
        cog,
        date,
        declination,
    })
}

// $GPZDA,hhmmss.ss,dd,mm,yyyy,zh,zm
fn zda(f: &Fields) -> Result<Zda, DecodeError> {
    let time = f.time(0, "time")?;
    let day = f.u32(1).ok_or_else(|| DecodeError::missing("ZDA", "day"))?;
    let month = f.u32(2).ok_or_else(|| DecodeError::missing("ZDA", "month"))?;
    let year = f
        .text(3)
        .and_then(|y| y.parse::<i32>().ok())
        .ok_or_else(|| DecodeError::missing("ZDA", "year"))?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DecodeError::invalid("ZDA", "date", &format!("{year}-{month}-{day}")))?;
    Ok(Zda {
        timestamp: Utc.from_utc_datetime(&date.and_time(time)),
    })
}

// $IIVHW,hdt,T,hdm,M,bsp,N,kmh,K
fn vhw(f: &Fields) -> Vhw {
    let speed_knots = f
        .f64(4)
        .or_else(|| f.f64(6).and_then(|kmh| to_knots(kmh, Some('K'))));
    Vhw {
        heading_true: f.f64(0),
        heading_magnetic: f.f64(2),
        speed_knots,
    }
}

// $IIVLW,total,N,trip,N
fn vlw(f: &Fields) -> Result<Vlw, DecodeError> {
    let log = Vlw {
        total_nm: f.f64(0),
        trip_nm: f.f64(2),
    };
    if log.total_nm.is_none() && log.trip_nm.is_none() {
        return Err(DecodeError::missing("VLW", "distance"));
    }
    Ok(log)
}

// $IIMMB,inHg,I,bar,B
fn mmb(f: &Fields) -> Result<f64, DecodeError> {
    if let Some(bar) = f.f64(2) {
        return Ok(bar * 1000.0);
    }
    f.f64(0)
        .map(|inhg| inhg * 33.863_886)
        .ok_or_else(|| DecodeError::missing("MMB", "pressure"))
}

// $IIMWV,angle,R|T,speed,N|K|M,A
fn mwv(f: &Fields) -> Result<Wind, DecodeError> {
    if f.char(4) == Some('V') {
        return Err(DecodeError::Void("MWV"));
    }
    let angle = f.required_f64(0, "angle")?;
    let reference = match f.char(1) {
        Some('R') => WindReference::Apparent,
        Some('T') => WindReference::True,
        _ => return Err(DecodeError::missing("MWV", "reference")),
    };
    let raw_speed = f.required_f64(2, "speed")?;
    let speed_knots = to_knots(raw_speed, f.char(3))
        .ok_or_else(|| DecodeError::invalid("MWV", "speed unit", f.text(3).unwrap_or_default()))?;
    let angle = if angle > 180.0 { angle - 360.0 } else { angle };
    Ok(Wind {
        angle,
        speed_knots,
        reference,
    })
}

// $IIVWR,angle,L|R,kn,N,ms,M,kmh,K (VWT has the same layout)
fn side_wind(f: &Fields, reference: WindReference) -> Result<Wind, DecodeError> {
    let magnitude = f.required_f64(0, "angle")?;
    let angle = match f.char(1) {
        Some('L') => -magnitude,
        Some('R') => magnitude,
        _ => return Err(DecodeError::missing("VWR", "side")),
    };
    let speed_knots = f
        .f64(2)
        .or_else(|| f.f64(4).and_then(|ms| to_knots(ms, Some('M'))))
        .or_else(|| f.f64(6).and_then(|kmh| to_knots(kmh, Some('K'))))
        .ok_or_else(|| DecodeError::missing("VWR", "speed"))?;
    Ok(Wind {
        angle,
        speed_knots,
        reference,
    })
}

// $IIVDR,set_true,T,set_mag,M,drift,N
fn vdr(f: &Fields) -> Result<CurrentVector, DecodeError> {
    Ok(CurrentVector {
        set: f.required_f64(0, "set")?,
        drift: f.required_f64(4, "drift")?,
    })
}

// $GPVTG,cog,T,cog_mag,M,sog,N,kmh,K
fn vtg(f: &Fields) -> Result<Vtg, DecodeError> {
    let track = Vtg {
        cog: f.f64(0),
        sog: f
            .f64(4)
            .or_else(|| f.f64(6).and_then(|kmh| to_knots(kmh, Some('K')))),
    };
    if track.cog.is_none() && track.sog.is_none() {
        return Err(DecodeError::missing("VTG", "cog"));
    }
    Ok(track)
}

// $GPGLL,llll.ll,a,yyyyy.yy,a,hhmmss,A
fn gll(f: &Fields) -> Result<Gll, DecodeError> {
    if f.char(5) == Some('V') {
        return Err(DecodeError::Void("GLL"));
    }
    let lat = f.coordinate(0, "latitude")?;
    let lng = f.coordinate(2, "longitude")?;
    Ok(Gll {
        position: GeoPos::new(lat, lng),
        time: f.time(4, "time").ok(),
    })
}

// $IIHDG,hdg,dev,E|W,var,E|W
fn hdg(f: &Fields) -> Result<Hdg, DecodeError> {
    let signed = |value: Option<f64>, side: Option<char>| match (value, side) {
        (Some(v), Some('W')) => Some(-v),
        (Some(v), _) => Some(v),
        _ => None,
    };
    Ok(Hdg {
        heading: f.required_f64(0, "heading")?,
        deviation: signed(f.f64(1), f.char(2)),
        variation: signed(f.f64(3), f.char(4)),
    })
}

// $GPRMB,A,xte,L|R,orig,dest,lat,N,lon,W,range,bearing,vmg,arrived
fn rmb(f: &Fields) -> Rmb {
    let destination_position = match (f.optional_coordinate(5), f.optional_coordinate(7)) {
        (Some(lat), Some(lng)) => Some(GeoPos::new(lat, lng)),
        _ => None,
    };
    Rmb {
        active: f.char(0) == Some('A'),
        xte: f.f64(1),
        steer: f.char(2),
        origin: f.text(3).map(str::to_string),
        destination: f.text(4).map(str::to_string),
        destination_position,
        range_nm: f.f64(9),
        bearing: f.f64(10),
        closing_speed: f.f64(11),
    }
}

// $IIDBT,feet,f,meters,M,fathoms,F
fn dbt(f: &Fields) -> Result<f64, DecodeError> {
    f.f64(2)
        .or_else(|| f.f64(0).map(|feet| feet * 0.3048))
        .or_else(|| f.f64(4).map(|fathoms| fathoms * 1.8288))
        .ok_or_else(|| DecodeError::missing("DBT", "depth"))
}

// $IIDPT,depth,offset
fn dpt(f: &Fields) -> Result<f64, DecodeError> {
    let depth = f.required_f64(0, "depth")?;
    Ok(depth + f.f64(1).unwrap_or(0.0).max(0.0))
}

// $GPGSV,total,num,in_view,(prn,elev,az,snr)*
fn gsv(f: &Fields) -> Result<Gsv, DecodeError> {
    let total_messages = f.u32(0).ok_or_else(|| DecodeError::missing("GSV", "total"))?;
    let message_number = f.u32(1).ok_or_else(|| DecodeError::missing("GSV", "number"))?;
    let satellites = (0..4)
        .filter_map(|block| {
            let base = 3 + block * 4;
            f.u32(base).map(|prn| SatelliteInfo {
                prn,
                elevation: f.u16(base + 1),
                azimuth: f.u16(base + 2),
                snr: f.u16(base + 3),
            })
        })
        .collect();
    Ok(Gsv {
        total_messages,
        message_number,
        satellites_in_view: f.u32(2),
        satellites,
    })
}

// $IIMDA,inHg,I,bar,B,air,C,water,C,rel_hum,abs_hum,dew,C,...
fn mda(f: &Fields) -> Mda {
    Mda {
        pressure_hpa: f
            .f64(2)
            .map(|bar| bar * 1000.0)
            .or_else(|| f.f64(0).map(|inhg| inhg * 33.863_886)),
        air_temperature: f.f64(4),
        water_temperature: f.f64(6),
        relative_humidity: f.f64(8),
    }
}

// $IIXDR,(type,value,unit,name)*
fn xdr(f: &Fields) -> Result<Vec<Transducer>, DecodeError> {
    let mut measurements = Vec::new();
    let mut base = 0;
    while let Some(kind) = f.char(base) {
        measurements.push(Transducer {
            kind,
            value: f.f64(base + 1),
            unit: f.char(base + 2),
            name: f.text(base + 3).map(str::to_string),
        });
        base += 4;
    }
    if measurements.is_empty() {
        return Err(DecodeError::missing("XDR", "type"));
    }
    Ok(measurements)
}

// $IIMWD,dir,T,dir_mag,M,kn,N,ms,M
fn mwd(f: &Fields) -> Result<Mwd, DecodeError> {
    let wind = Mwd {
        direction_true: f.f64(0),
        speed_knots: f
            .f64(4)
            .or_else(|| f.f64(6).and_then(|ms| to_knots(ms, Some('M')))),
    };
    if wind.direction_true.is_none() && wind.speed_knots.is_none() {
        return Err(DecodeError::missing("MWD", "wind"));
    }
    Ok(wind)
}

// $xxSTD,elapsed_ms
fn std_elapsed(f: &Fields) -> Result<u64, DecodeError> {
    let raw = f.required_text(0, "elapsed")?;
    raw.parse::<u64>()
        .map_err(|_| DecodeError::invalid("STD", "elapsed", raw))
}
