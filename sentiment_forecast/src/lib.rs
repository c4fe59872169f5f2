//! # Sentiment Forecast
//!
//! A Rust library for forecasting closing prices from a sentiment signal,
//! using two chained fitted SARIMAX models.
//!
//! ## Features
//!
//! - Historical price + sentiment data handling (CSV via polars)
//! - Fitted SARIMAX model artifacts loaded read-only at startup
//! - Two-stage chained forecasting: the sentiment-EWMA series is forecast
//!   first, then fed as the exogenous regressor to the closing-price model
//! - Daily forecast horizons with explicit date labelling
//! - 95% confidence interval band on every predicted close
//!
//! ## Quick Start
//!
//! ```no_run
//! use sentiment_forecast::data::DataLoader;
//! use sentiment_forecast::horizon::parse_target_date;
//! use sentiment_forecast::models::FittedSarimax;
//! use sentiment_forecast::service::ForecastService;
//!
//! # fn main() -> sentiment_forecast::error::Result<()> {
//! // Load the artifacts produced by the offline training step
//! let driver = FittedSarimax::from_json_file("ewma_model.json")?;
//! let target = FittedSarimax::from_json_file("stock_model.json")?;
//! let historical = DataLoader::from_csv("merged_data.csv")?;
//!
//! let service = ForecastService::new(driver, target, historical)?;
//!
//! // Forecast through a future date
//! let outcome = service.forecast_to(parse_target_date("2024-06-30")?)?;
//! println!(
//!     "predicted close: {:.2} (95% CI {:.2} - {:.2})",
//!     outcome.selected.predicted_close,
//!     outcome.selected.lower_ci,
//!     outcome.selected.upper_ci,
//! );
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod forecast;
pub mod horizon;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use crate::data::{DataLoader, HistoricalRecord, MergedSeries};
pub use crate::error::{ForecastError, ForecastStage, Result};
pub use crate::forecast::{forecast_to_date, DatedSeries, ForecastRow, ForecastTable};
pub use crate::horizon::{parse_target_date, Horizon};
pub use crate::models::{FittedForecastModel, FittedSarimax, ForecastResult};
pub use crate::service::{ForecastOutcome, ForecastService, SentimentLabel};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
