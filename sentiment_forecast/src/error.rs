//! Error types for the sentiment_forecast crate

use chrono::NaiveDate;
use thiserror::Error;

/// Which stage of the chained forecast failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastStage {
    /// The sentiment-EWMA driver model
    Driver,
    /// The closing-price target model
    Target,
}

impl std::fmt::Display for ForecastStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastStage::Driver => write!(f, "driver"),
            ForecastStage::Target => write!(f, "target"),
        }
    }
}

/// Custom error types for the sentiment_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A model artifact or the historical data table is missing or unreadable.
    /// Forecasting is unavailable until the resource is restored.
    #[error("startup resource error: {0}")]
    StartupResource(String),

    /// Caller-supplied date that does not parse as a calendar date
    #[error("malformed date '{input}': {reason}")]
    MalformedDate { input: String, reason: String },

    /// Target date is not strictly after the last observed date
    #[error("target date {target} is not after the last observed date {last}")]
    NonFutureDate { target: NaiveDate, last: NaiveDate },

    /// An underlying model call failed; `stage` names the failing model
    #[error("{stage} model forecast failed: {reason}")]
    ForecastComputation {
        stage: ForecastStage,
        reason: String,
    },

    /// Error related to data validation or processing
    #[error("data error: {0}")]
    Data(String),

    /// Error from mathematical operations
    #[error("math error: {0}")]
    Math(String),

    /// Error from invalid parameters
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("polars error: {0}")]
    Polars(String),

    /// Error from (de)serializing a model artifact
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<polars::prelude::PolarsError> for ForecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}
