//! Request-serving state: artifacts and data loaded once at startup
//!
//! A [`ForecastService`] holds the process-wide read-only state: both fitted
//! models and the historical table, loaded once before any request is served
//! and never invalidated (restart to reload).
//! All handles are read-only, so one service can serve concurrent requests.

use crate::data::{DataLoader, MergedSeries};
use crate::error::{ForecastError, Result};
use crate::forecast::{forecast_to_date, ForecastRow, ForecastTable};
use crate::horizon::parse_target_date;
use crate::models::FittedSarimax;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Policy bound on how far ahead a request may look
pub const MAX_FORECAST_DAYS: i64 = 365;

/// Display classification of a sentiment score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Classify a smoothed sentiment score. Scores within ±0.05 of zero read
    /// as neutral.
    pub fn from_score(score: f64) -> Self {
        if score > 0.05 {
            SentimentLabel::Positive
        } else if score < -0.05 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Negative => write!(f, "negative"),
            SentimentLabel::Neutral => write!(f, "neutral"),
        }
    }
}

/// A served forecast: the full horizon table plus the row selected for the
/// requested date
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutcome {
    /// One row per horizon date
    pub table: ForecastTable,
    /// The row for the requested date (or the last row, see
    /// [`ForecastTable::select`])
    pub selected: ForecastRow,
    /// Sentiment classification of the selected row's predicted EWMA
    pub sentiment: SentimentLabel,
}

/// Loaded, read-only forecasting state
#[derive(Debug, Clone)]
pub struct ForecastService {
    driver: FittedSarimax,
    target: FittedSarimax,
    historical: MergedSeries,
}

impl ForecastService {
    /// Assemble a service from already-loaded parts.
    ///
    /// The driver model must be univariate and the target model must declare
    /// exactly one exogenous regressor; anything else means the artifacts do
    /// not belong to this pipeline.
    pub fn new(
        driver: FittedSarimax,
        target: FittedSarimax,
        historical: MergedSeries,
    ) -> Result<Self> {
        driver.validate()?;
        target.validate()?;

        if driver.exog_count() != 0 {
            return Err(ForecastError::StartupResource(format!(
                "driver model '{}' must not declare exogenous regressors",
                driver.name
            )));
        }
        if target.exog_count() != 1 {
            return Err(ForecastError::StartupResource(format!(
                "target model '{}' must declare exactly one exogenous regressor, has {}",
                target.name,
                target.exog_count()
            )));
        }

        Ok(Self {
            driver,
            target,
            historical,
        })
    }

    /// Load both model artifacts and the historical table from disk.
    ///
    /// Any missing or corrupt resource fails the load with a
    /// [`ForecastError::StartupResource`] naming it; no forecasting is
    /// possible until all three resolve.
    pub fn load<P: AsRef<Path>>(driver_path: P, target_path: P, data_path: P) -> Result<Self> {
        let driver = FittedSarimax::from_json_file(driver_path)?;
        let target = FittedSarimax::from_json_file(target_path)?;

        let data_path = data_path.as_ref();
        let historical = DataLoader::from_csv(data_path).map_err(|e| {
            ForecastError::StartupResource(format!(
                "historical data '{}': {}",
                data_path.display(),
                e
            ))
        })?;

        Self::new(driver, target, historical)
    }

    /// The historical table the service was loaded with
    pub fn historical(&self) -> &MergedSeries {
        &self.historical
    }

    /// Forecast through `target_date` and select its row.
    pub fn forecast_to(&self, target_date: NaiveDate) -> Result<ForecastOutcome> {
        let last = self.historical.last_date();
        if target_date > last + Duration::days(MAX_FORECAST_DAYS) {
            return Err(ForecastError::InvalidParameter(format!(
                "target date {} is more than {} days after the last observation {}",
                target_date, MAX_FORECAST_DAYS, last
            )));
        }

        let table = forecast_to_date(target_date, &self.driver, &self.target, &self.historical)?;
        let selected = *table.select(target_date).ok_or_else(|| {
            ForecastError::Data("forecast produced no rows".to_string())
        })?;

        Ok(ForecastOutcome {
            sentiment: SentimentLabel::from_score(selected.predicted_ewma),
            table,
            selected,
        })
    }

    /// Parse a caller-supplied date string and forecast through it
    pub fn forecast_to_str(&self, raw: &str) -> Result<ForecastOutcome> {
        let target_date = parse_target_date(raw)?;
        self.forecast_to(target_date)
    }
}
