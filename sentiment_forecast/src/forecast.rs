//! Two-stage chained forecasting
//!
//! The sentiment-EWMA driver series is forecast first with its own model;
//! the forecasted driver values then become the exogenous input to the
//! closing-price model. Both models align output by position only, so every
//! model output is re-labelled onto the horizon dates before use.

use crate::data::MergedSeries;
use crate::error::{ForecastError, ForecastStage, Result};
use crate::horizon::Horizon;
use crate::models::FittedForecastModel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A value sequence with explicit calendar-date labels.
///
/// The positional-to-date re-labelling lives here so it is a named, testable
/// transformation rather than incidental ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DatedSeries {
    /// Label positional model output with dates: position 0 takes the first
    /// date, position n-1 the last.
    pub fn from_positional(dates: &[NaiveDate], values: &[f64]) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::Data(format!(
                "cannot label {} values with {} dates",
                values.len(),
                dates.len()
            )));
        }

        Ok(Self {
            dates: dates.to_vec(),
            values: values.to_vec(),
        })
    }

    /// The date labels in order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// The values in date order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of labelled values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value labelled with `date`, if present
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .iter()
            .position(|&d| d == date)
            .map(|idx| self.values[idx])
    }
}

/// One forecasted day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// Forecast date
    pub date: NaiveDate,
    /// Predicted closing price
    pub predicted_close: f64,
    /// Predicted sentiment EWMA
    pub predicted_ewma: f64,
    /// Lower 95% confidence bound on the predicted close
    pub lower_ci: f64,
    /// Upper 95% confidence bound on the predicted close
    pub upper_ci: f64,
}

/// The assembled forecast: one row per horizon date, ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
}

impl ForecastTable {
    /// The rows in date order
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// Number of forecasted days
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First forecasted row
    pub fn first(&self) -> Option<&ForecastRow> {
        self.rows.first()
    }

    /// Last forecasted row
    pub fn last(&self) -> Option<&ForecastRow> {
        self.rows.last()
    }

    /// Select the row for `target_date`, falling back to the last row when
    /// the exact date is absent. Returns `None` only on an empty table,
    /// which a successful forecast never produces.
    pub fn select(&self, target_date: NaiveDate) -> Option<&ForecastRow> {
        self.rows
            .iter()
            .find(|row| row.date == target_date)
            .or_else(|| self.rows.last())
    }
}

/// Forecast the closing price through `target_date`.
///
/// Resolver failures propagate unchanged; model failures surface as
/// [`ForecastError::ForecastComputation`] naming the failing stage, with no
/// partial table.
pub fn forecast_to_date(
    target_date: NaiveDate,
    driver: &dyn FittedForecastModel,
    target: &dyn FittedForecastModel,
    historical: &MergedSeries,
) -> Result<ForecastTable> {
    let horizon = Horizon::resolve(historical.last_date(), target_date)?;
    let steps = horizon.len();

    // Stage one: forecast the driver series over the horizon.
    let driver_out = driver
        .forecast(steps, None)
        .map_err(|e| stage_failure(ForecastStage::Driver, driver.name(), &e))?;
    if driver_out.values().len() != steps {
        return Err(ForecastError::ForecastComputation {
            stage: ForecastStage::Driver,
            reason: format!(
                "{}: returned {} values for {} steps",
                driver.name(),
                driver_out.values().len(),
                steps
            ),
        });
    }
    let predicted_ewma = DatedSeries::from_positional(horizon.dates(), driver_out.values())?;

    // Stage two: the re-labelled driver means are the exogenous input.
    let target_out = target
        .forecast(steps, Some(predicted_ewma.values()))
        .map_err(|e| stage_failure(ForecastStage::Target, target.name(), &e))?;
    if target_out.values().len() != steps {
        return Err(ForecastError::ForecastComputation {
            stage: ForecastStage::Target,
            reason: format!(
                "{}: returned {} values for {} steps",
                target.name(),
                target_out.values().len(),
                steps
            ),
        });
    }
    let intervals = target_out
        .intervals()
        .ok_or_else(|| ForecastError::ForecastComputation {
            stage: ForecastStage::Target,
            reason: format!("{}: returned no confidence interval", target.name()),
        })?;
    let predicted_close = DatedSeries::from_positional(horizon.dates(), target_out.values())?;

    let mut rows = Vec::with_capacity(steps);
    for (idx, &date) in predicted_close.dates().iter().enumerate() {
        let close = predicted_close.values()[idx];
        let (lower, upper) = intervals[idx];

        // An interval that does not bracket its own mean is a model defect;
        // surface it instead of correcting it.
        if lower > close || close > upper {
            return Err(ForecastError::ForecastComputation {
                stage: ForecastStage::Target,
                reason: format!(
                    "{}: interval ({:.6}, {:.6}) does not bracket mean {:.6} at {}",
                    target.name(),
                    lower,
                    upper,
                    close,
                    date
                ),
            });
        }

        rows.push(ForecastRow {
            date,
            predicted_close: close,
            predicted_ewma: predicted_ewma.values()[idx],
            lower_ci: lower,
            upper_ci: upper,
        });
    }

    Ok(ForecastTable { rows })
}

fn stage_failure(stage: ForecastStage, name: &str, err: &ForecastError) -> ForecastError {
    ForecastError::ForecastComputation {
        stage,
        reason: format!("{}: {}", name, err),
    }
}
