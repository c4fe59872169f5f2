//! Forecast horizon construction

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};

/// Calendar-date format accepted from callers
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a caller-supplied target date.
///
/// Only unambiguous `YYYY-MM-DD` calendar dates are accepted; anything else
/// is a [`ForecastError::MalformedDate`].
pub fn parse_target_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
        ForecastError::MalformedDate {
            input: raw.to_string(),
            reason: e.to_string(),
        }
    })
}

/// The ordered daily date sequence a forecast covers.
///
/// Starts the day after the last known observation and ends at the target
/// date inclusive; gap-free, duplicate-free, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Horizon {
    dates: Vec<NaiveDate>,
}

impl Horizon {
    /// Resolve the horizon between the last known date and a target date.
    ///
    /// Fails with [`ForecastError::NonFutureDate`] unless `target` is
    /// strictly after `last_known`. Pure function of its inputs.
    pub fn resolve(last_known: NaiveDate, target: NaiveDate) -> Result<Self> {
        if target <= last_known {
            return Err(ForecastError::NonFutureDate {
                target,
                last: last_known,
            });
        }

        let steps = (target - last_known).num_days();
        let mut dates = Vec::with_capacity(steps as usize);
        for offset in 1..=steps {
            dates.push(last_known + Duration::days(offset));
        }

        Ok(Self { dates })
    }

    /// Number of daily steps in the horizon (always at least 1)
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// A resolved horizon is never empty
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The horizon dates in ascending order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// First date of the horizon (the day after the last observation)
    pub fn first(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Last date of the horizon (the target date)
    pub fn last(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }
}
