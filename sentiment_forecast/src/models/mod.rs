//! Fitted forecasting models

use crate::error::{ForecastError, Result};
use std::fmt::Debug;

/// Forecast output: a predicted-mean sequence and, when the model provides
/// one, a per-step confidence interval band.
///
/// Values are aligned by position only; the caller owns the mapping from
/// positions to calendar dates.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted mean values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Confidence intervals (optional)
    intervals: Option<Vec<(f64, f64)>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::InvalidParameter(format!(
                "values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: None,
        })
    }

    /// Create a new forecast result with confidence intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::InvalidParameter(format!(
                "values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        if intervals.len() != values.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: Some(intervals),
        })
    }

    /// Get the forecasted mean values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the confidence intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }
}

/// A fitted forecasting model handle.
///
/// Implementations are read-only after construction: `forecast` takes
/// `&self` and is a pure function of the stored state, so a handle can be
/// shared across concurrent requests without serializing access. Calling
/// twice with the same inputs yields the same output.
pub trait FittedForecastModel: Debug + Send + Sync {
    /// Forecast `steps` periods ahead.
    ///
    /// `exog` carries one exogenous value per forecasted step for models
    /// fitted with an exogenous regressor, and must be `None` otherwise.
    fn forecast(&self, steps: usize, exog: Option<&[f64]>) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

pub mod sarimax;

pub use sarimax::FittedSarimax;
