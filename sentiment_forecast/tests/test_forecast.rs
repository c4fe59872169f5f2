use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use sentiment_forecast::data::{HistoricalRecord, MergedSeries};
use sentiment_forecast::error::{ForecastError, ForecastStage, Result};
use sentiment_forecast::forecast::forecast_to_date;
use sentiment_forecast::models::{FittedForecastModel, FittedSarimax, ForecastResult};
use std::sync::Mutex;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn history_ending(last: NaiveDate, len: usize) -> MergedSeries {
    let records = (0..len)
        .map(|i| HistoricalRecord {
            date: last - Duration::days((len - 1 - i) as i64),
            close: 100.0 + i as f64,
            ewma_sentiment: 0.1,
        })
        .collect();
    MergedSeries::new(records).unwrap()
}

/// Deterministic model that records every forecast call
#[derive(Debug)]
struct StubModel {
    name: String,
    values: Vec<f64>,
    intervals: Option<Vec<(f64, f64)>>,
    calls: Mutex<Vec<(usize, Option<Vec<f64>>)>>,
}

impl StubModel {
    fn new(name: &str, values: Vec<f64>, intervals: Option<Vec<(f64, f64)>>) -> Self {
        Self {
            name: name.to_string(),
            values,
            intervals,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(usize, Option<Vec<f64>>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl FittedForecastModel for StubModel {
    fn forecast(&self, steps: usize, exog: Option<&[f64]>) -> Result<ForecastResult> {
        self.calls
            .lock()
            .unwrap()
            .push((steps, exog.map(|e| e.to_vec())));

        if self.values.len() != steps {
            return Err(ForecastError::Math(format!(
                "stub holds {} values, {} steps requested",
                self.values.len(),
                steps
            )));
        }

        match &self.intervals {
            Some(intervals) => {
                ForecastResult::new_with_intervals(self.values.clone(), steps, intervals.clone())
            }
            None => ForecastResult::new(self.values.clone(), steps),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Model whose forecast always fails
#[derive(Debug)]
struct FailingModel {
    name: String,
}

impl FittedForecastModel for FailingModel {
    fn forecast(&self, _steps: usize, _exog: Option<&[f64]>) -> Result<ForecastResult> {
        Err(ForecastError::Math(
            "singular state covariance".to_string(),
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn random_walk_driver(last_level: f64) -> FittedSarimax {
    FittedSarimax {
        name: "ewma random walk".to_string(),
        ar: vec![],
        ma: vec![],
        seasonal_ar: vec![],
        seasonal_ma: vec![],
        seasonal_period: 0,
        diff: 1,
        seasonal_diff: 0,
        intercept: 0.0,
        exog_coef: vec![],
        sigma2: 0.01,
        recent_diffed: vec![0.0],
        recent_residuals: vec![],
        recent_levels: vec![last_level],
    }
}

fn ar1_target(beta: f64, last_adjusted: f64) -> FittedSarimax {
    FittedSarimax {
        name: "close AR(1)".to_string(),
        ar: vec![0.5],
        ma: vec![],
        seasonal_ar: vec![],
        seasonal_ma: vec![],
        seasonal_period: 0,
        diff: 0,
        seasonal_diff: 0,
        intercept: 50.0,
        exog_coef: vec![beta],
        sigma2: 1.0,
        recent_diffed: vec![last_adjusted],
        recent_residuals: vec![],
        recent_levels: vec![],
    }
}

#[test]
fn test_five_day_chain() {
    let historical = history_ending(date(2024, 1, 10), 30);
    let driver = StubModel::new(
        "driver",
        vec![0.11, 0.12, 0.13, 0.14, 0.15],
        None,
    );
    let target = StubModel::new(
        "target",
        vec![101.0, 102.0, 103.0, 104.0, 105.0],
        Some(vec![
            (99.0, 103.0),
            (99.5, 104.5),
            (100.0, 106.0),
            (100.5, 107.5),
            (101.0, 109.0),
        ]),
    );

    let table = forecast_to_date(date(2024, 1, 15), &driver, &target, &historical).unwrap();

    assert_eq!(table.len(), 5);
    let dates: Vec<NaiveDate> = table.rows().iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 1, 11),
            date(2024, 1, 12),
            date(2024, 1, 13),
            date(2024, 1, 14),
            date(2024, 1, 15),
        ]
    );

    // Driver was asked for 5 steps without exogenous input
    assert_eq!(driver.calls(), vec![(5, None)]);

    // Target was asked for 5 steps with the driver's means as exogenous input
    assert_eq!(
        target.calls(),
        vec![(5, Some(vec![0.11, 0.12, 0.13, 0.14, 0.15]))]
    );

    let first = &table.rows()[0];
    assert_eq!(first.predicted_close, 101.0);
    assert_eq!(first.predicted_ewma, 0.11);
    assert_eq!(first.lower_ci, 99.0);
    assert_eq!(first.upper_ci, 103.0);
}

#[test]
fn test_positional_output_relabelled_to_horizon_dates() {
    let historical = history_ending(date(2024, 3, 1), 10);
    let driver = StubModel::new("driver", vec![1.0, 2.0, 3.0], None);
    let target = StubModel::new(
        "target",
        vec![10.0, 20.0, 30.0],
        Some(vec![(9.0, 11.0), (19.0, 21.0), (29.0, 31.0)]),
    );

    let table = forecast_to_date(date(2024, 3, 4), &driver, &target, &historical).unwrap();

    // Position 0 maps to the first horizon date, in order
    assert_eq!(table.rows()[0].date, date(2024, 3, 2));
    assert_eq!(table.rows()[0].predicted_ewma, 1.0);
    assert_eq!(table.rows()[1].date, date(2024, 3, 3));
    assert_eq!(table.rows()[1].predicted_ewma, 2.0);
    assert_eq!(table.rows()[2].date, date(2024, 3, 4));
    assert_eq!(table.rows()[2].predicted_ewma, 3.0);
}

#[test]
fn test_target_failure_names_stage_and_returns_no_rows() {
    let historical = history_ending(date(2024, 1, 10), 30);
    let driver = StubModel::new("driver", vec![0.1, 0.2, 0.3], None);
    let target = FailingModel {
        name: "close model".to_string(),
    };

    let result = forecast_to_date(date(2024, 1, 13), &driver, &target, &historical);

    match result {
        Err(ForecastError::ForecastComputation { stage, reason }) => {
            assert_eq!(stage, ForecastStage::Target);
            assert!(reason.contains("close model"));
        }
        other => panic!("expected target-stage ForecastComputation, got {:?}", other),
    }
}

#[test]
fn test_driver_failure_names_stage() {
    let historical = history_ending(date(2024, 1, 10), 30);
    let driver = FailingModel {
        name: "ewma model".to_string(),
    };
    let target = StubModel::new("target", vec![100.0], Some(vec![(99.0, 101.0)]));

    let result = forecast_to_date(date(2024, 1, 11), &driver, &target, &historical);

    match result {
        Err(ForecastError::ForecastComputation { stage, reason }) => {
            assert_eq!(stage, ForecastStage::Driver);
            assert!(reason.contains("ewma model"));
        }
        other => panic!("expected driver-stage ForecastComputation, got {:?}", other),
    }
}

#[test]
fn test_target_without_intervals_is_a_target_failure() {
    let historical = history_ending(date(2024, 1, 10), 30);
    let driver = StubModel::new("driver", vec![0.1, 0.2], None);
    let target = StubModel::new("target", vec![100.0, 101.0], None);

    let result = forecast_to_date(date(2024, 1, 12), &driver, &target, &historical);

    match result {
        Err(ForecastError::ForecastComputation { stage, reason }) => {
            assert_eq!(stage, ForecastStage::Target);
            assert!(reason.contains("confidence interval"));
        }
        other => panic!("expected target-stage ForecastComputation, got {:?}", other),
    }
}

#[test]
fn test_interval_not_bracketing_mean_is_surfaced() {
    let historical = history_ending(date(2024, 1, 10), 30);
    let driver = StubModel::new("driver", vec![0.1], None);
    // Upper bound below the mean
    let target = StubModel::new("target", vec![100.0], Some(vec![(90.0, 95.0)]));

    let result = forecast_to_date(date(2024, 1, 11), &driver, &target, &historical);

    match result {
        Err(ForecastError::ForecastComputation { stage, .. }) => {
            assert_eq!(stage, ForecastStage::Target);
        }
        other => panic!("expected target-stage ForecastComputation, got {:?}", other),
    }
}

#[test]
fn test_non_future_date_propagates_unchanged() {
    let historical = history_ending(date(2024, 1, 10), 30);
    let driver = StubModel::new("driver", vec![0.1], None);
    let target = StubModel::new("target", vec![100.0], Some(vec![(99.0, 101.0)]));

    let result = forecast_to_date(date(2024, 1, 10), &driver, &target, &historical);

    assert!(matches!(result, Err(ForecastError::NonFutureDate { .. })));
    // Neither model was called
    assert!(driver.calls().is_empty());
    assert!(target.calls().is_empty());
}

#[test]
fn test_forecast_is_idempotent() {
    let historical = history_ending(date(2024, 1, 10), 30);
    let driver = random_walk_driver(0.2);
    let target = ar1_target(10.0, 4.0);

    let first = forecast_to_date(date(2024, 2, 9), &driver, &target, &historical).unwrap();
    let second = forecast_to_date(date(2024, 2, 9), &driver, &target, &historical).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_intervals_bracket_means_and_widen() {
    let historical = history_ending(date(2024, 1, 10), 30);
    let driver = random_walk_driver(0.2);
    let target = ar1_target(10.0, 4.0);

    let table = forecast_to_date(date(2024, 1, 31), &driver, &target, &historical).unwrap();

    assert_eq!(table.len(), 21);
    let mut previous_width = 0.0;
    for row in table.rows() {
        assert!(row.lower_ci <= row.predicted_close);
        assert!(row.predicted_close <= row.upper_ci);
        let width = row.upper_ci - row.lower_ci;
        assert!(width > previous_width);
        previous_width = width;
    }
}

#[test]
fn test_selector_exact_date_and_fallback() {
    let historical = history_ending(date(2024, 1, 10), 30);
    let driver = StubModel::new("driver", vec![0.1, 0.2, 0.3, 0.4, 0.5], None);
    let target = StubModel::new(
        "target",
        vec![101.0, 102.0, 103.0, 104.0, 105.0],
        Some(vec![
            (100.0, 102.0),
            (101.0, 103.0),
            (102.0, 104.0),
            (103.0, 105.0),
            (104.0, 106.0),
        ]),
    );

    let table = forecast_to_date(date(2024, 1, 15), &driver, &target, &historical).unwrap();

    // Exact match: the third row's date selects exactly that row
    let exact = table.select(date(2024, 1, 13)).unwrap();
    assert_eq!(exact.date, date(2024, 1, 13));
    assert_eq!(exact.predicted_close, 103.0);

    // Absent date: selection falls back to the last row without failing
    let fallback = table.select(date(2024, 6, 1)).unwrap();
    assert_eq!(fallback.date, date(2024, 1, 15));
    assert_eq!(fallback.predicted_close, 105.0);
}
