//! Field-level parsers shared by the sentence decoders.

use chrono::{NaiveDate, NaiveTime};

use crate::DecodeError;

/// Field cursor bound to one sentence type, for error context
pub(crate) struct Fields<'a> {
    sentence: &'static str,
    fields: &'a [&'a str],
}

impl<'a> Fields<'a> {
    pub(crate) fn new(sentence: &'static str, fields: &'a [&'a str]) -> Self {
        Self { sentence, fields }
    }

    /// Raw text, `None` when absent or empty
    pub(crate) fn text(&self, idx: usize) -> Option<&'a str> {
        self.fields
            .get(idx)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
    }

    pub(crate) fn required_text(&self, idx: usize, name: &'static str) -> Result<&'a str, DecodeError> {
        self.text(idx)
            .ok_or_else(|| DecodeError::missing(self.sentence, name))
    }

    /// Optional number: absent or unparseable fields read as `None`
    pub(crate) fn f64(&self, idx: usize) -> Option<f64> {
        self.text(idx).and_then(|f| f.parse::<f64>().ok())
    }

    pub(crate) fn required_f64(&self, idx: usize, name: &'static str) -> Result<f64, DecodeError> {
        let raw = self.required_text(idx, name)?;
        raw.parse::<f64>()
            .map_err(|_| DecodeError::invalid(self.sentence, name, raw))
    }

    pub(crate) fn u32(&self, idx: usize) -> Option<u32> {
        self.text(idx).and_then(|f| f.parse::<u32>().ok())
    }

    pub(crate) fn u16(&self, idx: usize) -> Option<u16> {
        self.text(idx).and_then(|f| f.parse::<u16>().ok())
    }

    pub(crate) fn char(&self, idx: usize) -> Option<char> {
        self.text(idx).and_then(|f| f.chars().next())
    }

    /// `ddmm.mmm` + hemisphere at `idx`, `idx + 1`
    pub(crate) fn coordinate(&self, idx: usize, name: &'static str) -> Result<f64, DecodeError> {
        let raw = self.required_text(idx, name)?;
        let hemisphere = self.required_text(idx + 1, name)?;
        parse_coordinate(raw, hemisphere).ok_or_else(|| DecodeError::invalid(self.sentence, name, raw))
    }

    pub(crate) fn optional_coordinate(&self, idx: usize) -> Option<f64> {
        parse_coordinate(self.text(idx)?, self.text(idx + 1)?)
    }

    pub(crate) fn time(&self, idx: usize, name: &'static str) -> Result<NaiveTime, DecodeError> {
        let raw = self.required_text(idx, name)?;
        parse_time(raw).ok_or_else(|| DecodeError::invalid(self.sentence, name, raw))
    }

    pub(crate) fn date(&self, idx: usize, name: &'static str) -> Result<NaiveDate, DecodeError> {
        let raw = self.required_text(idx, name)?;
        parse_date(raw).ok_or_else(|| DecodeError::invalid(self.sentence, name, raw))
    }
}

/// Convert `ddmm.mmm`/`dddmm.mmm` with a N/S/E/W letter to signed decimal degrees
pub(crate) fn parse_coordinate(raw: &str, hemisphere: &str) -> Option<f64> {
    let value: f64 = raw.parse().ok()?;
    if value < 0.0 {
        return None;
    }
    let degrees = (value / 100.0).floor();
    let minutes = value - degrees * 100.0;
    if minutes >= 60.0 {
        return None;
    }
    let decimal = degrees + minutes / 60.0;
    match hemisphere {
        "N" | "E" => Some(decimal),
        "S" | "W" => Some(-decimal),
        _ => None,
    }
}

/// `hhmmss` with optional fractional seconds
pub(crate) fn parse_time(raw: &str) -> Option<NaiveTime> {
    if raw.len() < 6 || !raw.is_char_boundary(6) {
        return None;
    }
    let (hms, fraction) = raw.split_at(6);
    let hour: u32 = hms.get(0..2)?.parse().ok()?;
    let minute: u32 = hms.get(2..4)?.parse().ok()?;
    let second: u32 = hms.get(4..6)?.parse().ok()?;
    let millis = if fraction.is_empty() || fraction == "." {
        0
    } else {
        let digits = fraction.strip_prefix('.')?;
        let frac: f64 = format!("0.{digits}").parse().ok()?;
        (frac * 1000.0).round().min(999.0) as u32
    };
    NaiveTime::from_hms_milli_opt(hour, minute, second, millis)
}

/// `ddmmyy`, two-digit years below 70 read as 20yy
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 6 {
        return None;
    }
    let day: u32 = raw.get(0..2)?.parse().ok()?;
    let month: u32 = raw.get(2..4)?.parse().ok()?;
    let yy: i32 = raw.get(4..6)?.parse().ok()?;
    let year = if yy < 70 { 2000 + yy } else { 1900 + yy };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Speed converted to knots from a unit letter
pub(crate) fn to_knots(value: f64, unit: Option<char>) -> Option<f64> {
    match unit.unwrap_or('N') {
        'N' => Some(value),
        'K' => Some(value / 1.852),
        'M' => Some(value * 3600.0 / 1852.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        let lat = parse_coordinate("4807.038", "N").unwrap();
        assert!((lat - 48.1173).abs() < 1e-4);

        let lng = parse_coordinate("01131.000", "W").unwrap();
        assert!((lng + 11.516_666_7).abs() < 1e-6);

        assert!(parse_coordinate("4807.038", "X").is_none());
        assert!(parse_coordinate("4875.000", "N").is_none());
        assert!(parse_coordinate("abc", "N").is_none());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time("123519"),
            NaiveTime::from_hms_opt(12, 35, 19)
        );
        assert_eq!(
            parse_time("123519.25"),
            NaiveTime::from_hms_milli_opt(12, 35, 19, 250)
        );
        assert!(parse_time("1235").is_none());
        assert!(parse_time("246000").is_none());
    }

    #[test]
    fn test_parse_date_pivot() {
        assert_eq!(parse_date("230394"), NaiveDate::from_ymd_opt(1994, 3, 23));
        assert_eq!(parse_date("010124"), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(parse_date("320194").is_none());
    }

    #[test]
    fn test_to_knots() {
        assert_eq!(to_knots(10.0, Some('N')), Some(10.0));
        assert!((to_knots(1.852, Some('K')).unwrap() - 1.0).abs() < 1e-9);
        assert!((to_knots(1.0, Some('M')).unwrap() - 1.943_844).abs() < 1e-5);
        assert_eq!(to_knots(1.0, Some('X')), None);
    }
}
