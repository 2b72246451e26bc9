//! Error types for the pressure-link analysis pipeline.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Missing specification: {field}")]
    MissingSpecification { field: String },

    #[error("Station '{station}' is listed in the specifications but has no data")]
    MissingStation { station: String },

    #[error("Length mismatch for station '{station}': expected {expected} samples, got {actual}")]
    MismatchedLength {
        station: String,
        expected: usize,
        actual: usize,
    },

    #[error("Times of station '{station}' do not increase at sample {index}")]
    NonMonotonicTimes { station: String, index: usize },

    /// Never returned by the engines: they fall back to zero/empty output
    /// and log this value instead.
    #[error("Degenerate input for {what}: need {required} samples, have {available}")]
    DegenerateInput {
        what: String,
        required: usize,
        available: usize,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid station identifier: {0}")]
    InvalidStation(String),

    #[error("Invalid filter token: {0}")]
    InvalidFilterToken(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Error::MissingSpecification {
            field: field.into(),
        }
    }
}
