//! Sentence generation for values the multiplexer produces itself.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::{checksum, Transducer, WindReference};

/// Wrap a body as `$body*HH`
pub fn with_checksum(body: &str) -> String {
    format!("${}*{:02X}", body, checksum(body))
}

/// MWV with `angle` in -180..180 (written as 0..360)
pub fn mwv(prefix: &str, angle: f64, speed_knots: f64, reference: WindReference) -> String {
    let reference = match reference {
        WindReference::Apparent => 'R',
        WindReference::True => 'T',
    };
    let angle = angle.rem_euclid(360.0);
    with_checksum(&format!(
        "{prefix}MWV,{angle:.1},{reference},{speed_knots:.1},N,A"
    ))
}

/// VDR with the set in degrees true and the drift in knots
pub fn vdr(prefix: &str, set: f64, drift: f64) -> String {
    with_checksum(&format!("{prefix}VDR,{:.1},T,,M,{:.1},N", set.rem_euclid(360.0), drift))
}

/// ZDA for `at`, zone offset zero
pub fn zda(prefix: &str, at: DateTime<Utc>) -> String {
    with_checksum(&format!(
        "{prefix}ZDA,{:02}{:02}{:02}.{:02},{:02},{:02},{:04},00,00",
        at.hour(),
        at.minute(),
        at.second(),
        at.timestamp_subsec_millis() / 10,
        at.day(),
        at.month(),
        at.year()
    ))
}

/// XDR carrying every transducer reading with a value
pub fn xdr(prefix: &str, readings: &[Transducer]) -> String {
    let body: Vec<String> = readings
        .iter()
        .filter_map(|t| {
            t.value.map(|value| {
                format!(
                    "{},{:.4},{},{}",
                    t.kind,
                    value,
                    t.unit.map(String::from).unwrap_or_default(),
                    t.name.clone().unwrap_or_default()
                )
            })
        })
        .collect();
    with_checksum(&format!("{prefix}XDR,{}", body.join(",")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{valid_checksum, DecodedSentence, FieldDecoder, Nmea0183Decoder};
    use chrono::TimeZone;

    #[test]
    fn test_checksum_matches_reference() {
        let line =
            with_checksum("GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W");
        assert!(line.ends_with("*6A"));
    }

    #[test]
    fn test_true_wind_round_trip() {
        let line = mwv("CC", -30.0, 14.2, WindReference::True);
        assert!(line.starts_with("$CCMWV,330.0,T,14.2,N,A*"));
        assert!(valid_checksum(&line));
    }

    #[test]
    fn test_zda_decodes_to_same_instant() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 5).unwrap();
        let line = zda("GP", at);
        let DecodedSentence::Zda(zda) = Nmea0183Decoder.decode(&line).unwrap() else {
            panic!("expected ZDA");
        };
        assert_eq!(zda.timestamp, at);
    }

    #[test]
    fn test_xdr_skips_missing_values() {
        let line = xdr(
            "RN",
            &[
                Transducer {
                    kind: 'H',
                    value: Some(50.0),
                    unit: Some('P'),
                    name: Some("HUM".into()),
                },
                Transducer {
                    kind: 'C',
                    value: None,
                    unit: Some('C'),
                    name: None,
                },
            ],
        );
        assert!(line.starts_with("$RNXDR,H,50.0000,P,HUM*"));
    }
}
