//! FieldDecoder - the seam between raw text and typed fields.

use crate::{split, valid_checksum, DecodeError, DecodedSentence};

/// Checksum validation plus typed field extraction
pub trait FieldDecoder: Send + Sync {
    fn valid_checksum(&self, sentence: &str) -> bool;

    /// Decode without checking the checksum
    fn decode(&self, sentence: &str) -> Result<DecodedSentence, DecodeError>;
}

/// NMEA0183 decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct Nmea0183Decoder;

impl FieldDecoder for Nmea0183Decoder {
    fn valid_checksum(&self, sentence: &str) -> bool {
        valid_checksum(sentence)
    }

    fn decode(&self, sentence: &str) -> Result<DecodedSentence, DecodeError> {
        let raw = split(sentence)?;
        DecodedSentence::decode(raw.id, &raw.fields)
    }
}
