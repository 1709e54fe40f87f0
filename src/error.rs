//! Error types for the DCA simulator.

use polars::prelude::PolarsError;
use thiserror::Error;
use time::Date;

/// Result type alias for simulator operations.
pub type Result<T> = std::result::Result<T, DcaError>;

/// Errors raised by the engine and its data collaborators.
///
/// Every variant is terminal for the current run: nothing is retried
/// internally and no partial output is returned.
#[derive(Error, Debug)]
pub enum DcaError {
    /// An observation cannot be valued (non-positive price, negative distribution).
    #[error("Invalid observation #{index} at {timestamp}: {reason}")]
    InvalidObservation {
        index: usize,
        timestamp: Date,
        reason: String,
    },

    /// Observations are not strictly increasing by timestamp.
    #[error("Observation #{index} at {current} does not follow {previous}")]
    UnorderedObservations {
        index: usize,
        previous: Date,
        current: Date,
    },

    /// Nothing to simulate.
    #[error("Empty input: no observations to simulate")]
    EmptyInput,

    /// Invalid run parameter.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The market-data source has nothing for the requested range.
    #[error("No data found for {ticker} between {start} and {end}")]
    NoDataFound {
        ticker: String,
        start: Date,
        end: Date,
    },

    /// Input frame is missing a column or has the wrong types.
    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Error parsing date '{value}': {message}")]
    DateParse { value: String, message: String },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DcaError {
    /// Create an invalid observation error.
    pub fn invalid_observation(index: usize, timestamp: Date, reason: impl Into<String>) -> Self {
        Self::InvalidObservation {
            index,
            timestamp,
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn date_parse(value: impl Into<String>, message: impl ToString) -> Self {
        Self::DateParse {
            value: value.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(feature = "python")]
impl From<DcaError> for pyo3::PyErr {
    fn from(err: DcaError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
