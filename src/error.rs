//! Error taxonomy for the fetch/calculate/forecast pipeline.
//!
//! Every fallible core operation returns one of these variants so callers
//! can isolate per-fund failures and decide recovery policy (e.g. degrade
//! to the non-forecast series when fitting fails).

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Network or HTTP-level failure talking to the pricing service.
    /// Propagated immediately; never downgraded to a partial result.
    #[error("price request failed for '{fund}'")]
    RemoteFetch {
        fund: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered, but the body did not match the expected shape.
    #[error("malformed response from pricing service: {detail}")]
    DataFormat { detail: String },

    /// The requested window contained no observations at all.
    #[error("no price observations for '{fund}' between {start} and {end}")]
    EmptyHistory {
        fund: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// Caller-supplied input is out of range (non-positive lump sum,
    /// malformed date).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Value calculation needs at least two price points.
    #[error("at least two price observations are required, got {0}")]
    InsufficientData(usize),

    /// The trend model could not be fitted on the given history.
    #[error("forecast model could not be fitted: {0}")]
    ForecastFitting(String),
}

pub type Result<T> = std::result::Result<T, Error>;
