//! Historical price and sentiment data handling

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// One observed trading day: closing price plus the smoothed sentiment score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Calendar date of the observation
    pub date: NaiveDate,
    /// Observed closing price
    pub close: f64,
    /// Exponentially weighted moving average of the sentiment score
    pub ewma_sentiment: f64,
}

/// The merged historical table the models were fitted against.
///
/// Dates are strictly increasing with no duplicates; the table is immutable
/// once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSeries {
    records: Vec<HistoricalRecord>,
}

impl MergedSeries {
    /// Create a validated series from records sorted ascending by date
    pub fn new(records: Vec<HistoricalRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ForecastError::Data(
                "historical series is empty".to_string(),
            ));
        }

        for pair in records.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ForecastError::Data(format!(
                    "dates must be strictly increasing: {} does not follow {}",
                    pair[1].date, pair[0].date
                )));
            }
        }

        Ok(Self { records })
    }

    /// Get the records
    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the series is empty (never true for a constructed series)
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Date of the most recent observation
    pub fn last_date(&self) -> NaiveDate {
        self.records[self.records.len() - 1].date
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.close).collect()
    }

    /// Smoothed sentiment values in date order
    pub fn ewma_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.ewma_sentiment).collect()
    }
}

/// Data loader for the merged price + sentiment table
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load the merged table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<MergedSeries> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Build the merged table from an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Result<MergedSeries> {
        let date_column = Self::detect_date_column(&df)?;
        let close_column = Self::detect_close_column(&df)?;
        let sentiment_column = Self::detect_sentiment_column(&df)?;

        let dates = Self::column_as_dates(&df, &date_column)?;
        let closes = Self::column_as_f64(&df, &close_column)?;
        let ewma = Self::column_as_f64(&df, &sentiment_column)?;

        if dates.len() != closes.len() || dates.len() != ewma.len() {
            return Err(ForecastError::Data(format!(
                "columns have unequal lengths after dropping nulls: {} dates, {} closes, {} sentiment values",
                dates.len(),
                closes.len(),
                ewma.len()
            )));
        }

        let records = dates
            .into_iter()
            .zip(closes)
            .zip(ewma)
            .map(|((date, close), ewma_sentiment)| HistoricalRecord {
                date,
                close,
                ewma_sentiment,
            })
            .collect();

        MergedSeries::new(records)
    }

    /// Build the merged table from in-memory records
    pub fn from_records(records: Vec<HistoricalRecord>) -> Result<MergedSeries> {
        MergedSeries::new(records)
    }

    /// Detect the date column in a DataFrame
    fn detect_date_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        for name in &column_names {
            let lower_name = name.to_lowercase();
            if lower_name.contains("date")
                || lower_name.contains("time")
                || lower_name.contains("timestamp")
            {
                return Ok(name.to_string());
            }
        }

        // Fall back to the first column if it has a temporal dtype
        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Ok(first_col.name().to_string());
            }
        }

        Err(ForecastError::Data(
            "no date column found in data".to_string(),
        ))
    }

    /// Detect the closing-price column
    fn detect_close_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        for name in &column_names {
            if name.to_lowercase().contains("close") {
                return Ok(name.to_string());
            }
        }

        for name in &column_names {
            if name.to_lowercase().contains("price") {
                return Ok(name.to_string());
            }
        }

        Err(ForecastError::Data(
            "no closing-price column found in data".to_string(),
        ))
    }

    /// Detect the smoothed-sentiment column
    fn detect_sentiment_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        for name in &column_names {
            let lower_name = name.to_lowercase();
            if lower_name.contains("ewma") || lower_name.contains("sentiment") {
                return Ok(name.to_string());
            }
        }

        Err(ForecastError::Data(
            "no sentiment column found in data".to_string(),
        ))
    }

    /// Get a column as f64 values
    fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::Data(format!("column '{}' not found: {}", column_name, e))
        })?;

        match col.dtype() {
            DataType::Float64 => Ok(col.f64()?.into_iter().flatten().collect()),
            DataType::Float32 => Ok(col
                .f32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int64 => Ok(col
                .i64()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int32 => Ok(col
                .i32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            _ => Err(ForecastError::Data(format!(
                "column '{}' cannot be converted to f64",
                column_name
            ))),
        }
    }

    /// Get a column as calendar dates
    fn column_as_dates(df: &DataFrame, column_name: &str) -> Result<Vec<NaiveDate>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::Data(format!("column '{}' not found: {}", column_name, e))
        })?;

        match col.dtype() {
            DataType::Date => col
                .date()?
                .into_iter()
                .flatten()
                .map(days_since_epoch_to_date)
                .collect(),
            DataType::Datetime(time_unit, _) => {
                let divisor = match time_unit {
                    TimeUnit::Nanoseconds => 1_000_000_000,
                    TimeUnit::Microseconds => 1_000_000,
                    TimeUnit::Milliseconds => 1_000,
                };
                col.datetime()?
                    .into_iter()
                    .flatten()
                    .map(|ts| {
                        DateTime::from_timestamp(ts / divisor, 0)
                            .map(|dt| dt.date_naive())
                            .ok_or_else(|| {
                                ForecastError::Data(format!(
                                    "timestamp {} in column '{}' is out of range",
                                    ts, column_name
                                ))
                            })
                    })
                    .collect()
            }
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .flatten()
                .map(|raw| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                        ForecastError::Data(format!(
                            "cannot parse '{}' in column '{}' as a date: {}",
                            raw, column_name, e
                        ))
                    })
                })
                .collect(),
            other => Err(ForecastError::Data(format!(
                "column '{}' has dtype {} which is not a date type",
                column_name, other
            ))),
        }
    }
}

fn days_since_epoch_to_date(days: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(days as i64)))
        .ok_or_else(|| ForecastError::Data(format!("date value {} is out of range", days)))
}

/// Exponentially weighted moving average with `alpha = 2 / (span + 1)`,
/// matching the smoothing used to build the sentiment column.
pub fn ewma(values: &[f64], span: usize) -> Result<Vec<f64>> {
    if span == 0 {
        return Err(ForecastError::InvalidParameter(
            "EWMA span must be at least 1".to_string(),
        ));
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut level = values[0];
    let mut smoothed = Vec::with_capacity(values.len());
    smoothed.push(level);

    for &value in &values[1..] {
        level = alpha * value + (1.0 - alpha) * level;
        smoothed.push(level);
    }

    Ok(smoothed)
}
