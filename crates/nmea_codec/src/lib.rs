//! # NMEA Codec
//!
//! Character-level handling of NMEA0183 sentences:
//! - checksum validation and computation
//! - talker / sentence id extraction (used by channel filters)
//! - typed field decoding per sentence type
//! - generation of the sentences the multiplexer emits itself

mod checksum;
mod decoder;
mod error;
mod fields;
pub mod generate;
mod sentences;

pub use checksum::{checksum, sentence_id, split, talker, valid_checksum, RawSentence};
pub use decoder::{FieldDecoder, Nmea0183Decoder};
pub use error::DecodeError;
pub use sentences::*;
