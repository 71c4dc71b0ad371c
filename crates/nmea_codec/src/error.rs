//! Decode error types

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// Not a `$`/`!` delimited sentence
    #[error("not a sentence: {0:?}")]
    NotASentence(String),

    /// Address field shorter than talker + id
    #[error("malformed address field '{0}'")]
    BadAddress(String),

    /// Required field missing or empty
    #[error("{sentence}: missing field '{field}'")]
    MissingField {
        sentence: &'static str,
        field: &'static str,
    },

    /// Field present but not parseable
    #[error("{sentence}: invalid field '{field}': {value:?}")]
    InvalidField {
        sentence: &'static str,
        field: &'static str,
        value: String,
    },

    /// Sentence marks its own data as void
    #[error("{0}: data flagged invalid")]
    Void(&'static str),
}

impl DecodeError {
    pub(crate) fn missing(sentence: &'static str, field: &'static str) -> Self {
        Self::MissingField { sentence, field }
    }

    pub(crate) fn invalid(sentence: &'static str, field: &'static str, value: &str) -> Self {
        Self::InvalidField {
            sentence,
            field,
            value: value.to_string(),
        }
    }
}
