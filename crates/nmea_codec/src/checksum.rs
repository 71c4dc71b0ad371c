//! Checksum and address handling.

use crate::DecodeError;

/// A sentence split into its address and data fields
#[derive(Debug, Clone, PartialEq)]
pub struct RawSentence<'a> {
    /// Two-letter talker (`GP`, `II`), or `P` for proprietary sentences
    pub talker: &'a str,
    /// Sentence id (`RMC`, `MWV`, ...)
    pub id: &'a str,
    /// Data fields, without the address and the checksum
    pub fields: Vec<&'a str>,
}

/// XOR of every byte between the start delimiter and `*`
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Body between the start delimiter and the `*` (or the end of line)
fn body(sentence: &str) -> Option<(&str, Option<&str>)> {
    let line = sentence.trim_end_matches(['\r', '\n']).trim();
    let rest = line.strip_prefix('$').or_else(|| line.strip_prefix('!'))?;
    Some(match rest.split_once('*') {
        Some((body, suffix)) => (body, Some(suffix)),
        None => (rest, None),
    })
}

/// True when the sentence carries a `*HH` suffix matching its body
pub fn valid_checksum(sentence: &str) -> bool {
    let Some((body, Some(suffix))) = body(sentence) else {
        return false;
    };
    if suffix.len() != 2 {
        return false;
    }
    match u8::from_str_radix(suffix, 16) {
        Ok(expected) => checksum(body) == expected,
        Err(_) => false,
    }
}

/// Split a sentence into talker, id and fields. The checksum is not verified.
pub fn split(sentence: &str) -> Result<RawSentence<'_>, DecodeError> {
    let (body, _) = body(sentence).ok_or_else(|| DecodeError::NotASentence(sentence.into()))?;
    let mut parts = body.split(',');
    let address = parts.next().unwrap_or_default();
    let (talker, id) = if let Some(id) = address.strip_prefix('P') {
        ("P", id)
    } else if address.len() >= 5 && address.is_char_boundary(2) {
        address.split_at(2)
    } else {
        return Err(DecodeError::BadAddress(address.to_string()));
    };
    if id.is_empty() {
        return Err(DecodeError::BadAddress(address.to_string()));
    }
    Ok(RawSentence {
        talker,
        id,
        fields: parts.collect(),
    })
}

/// Sentence id, e.g. `RMC` for `$GPRMC,...`
pub fn sentence_id(sentence: &str) -> Option<&str> {
    split(sentence).ok().map(|raw| raw.id)
}

/// Talker prefix, e.g. `GP` for `$GPRMC,...`
pub fn talker(sentence: &str) -> Option<&str> {
    split(sentence).ok().map(|raw| raw.talker)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    #[test]
    fn test_valid_checksum() {
        assert!(valid_checksum(RMC));
        assert!(valid_checksum(&format!("{RMC}\r\n")));
    }

    #[test]
    fn test_corrupted_checksum() {
        assert!(!valid_checksum(&RMC.replace("*6A", "*6B")));
        assert!(!valid_checksum(&RMC.replace("022.4", "023.4")));
        assert!(!valid_checksum("$GPRMC,123519,A"));
        assert!(!valid_checksum("$GPRMC,123519,A*ZZ"));
        assert!(!valid_checksum("GPRMC,123519*6A"));
    }

    #[test]
    fn test_split_address() {
        let raw = split(RMC).unwrap();
        assert_eq!(raw.talker, "GP");
        assert_eq!(raw.id, "RMC");
        assert_eq!(raw.fields.len(), 11);
        assert_eq!(raw.fields[0], "123519");
        assert_eq!(raw.fields[10], "W");
    }

    #[test]
    fn test_proprietary_and_bad_address() {
        let raw = split("$PGRMZ,246,f,3*1B").unwrap();
        assert_eq!(raw.talker, "P");
        assert_eq!(raw.id, "GRMZ");
        assert!(split("$GP,1,2").is_err());
        assert!(split("hello").is_err());
    }

    #[test]
    fn test_id_and_talker_helpers() {
        assert_eq!(sentence_id(RMC), Some("RMC"));
        assert_eq!(talker(RMC), Some("GP"));
        assert_eq!(sentence_id("garbage"), None);
    }
}
