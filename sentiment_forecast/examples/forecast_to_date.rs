use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use sentiment_forecast::data::{ewma, DataLoader, HistoricalRecord};
use sentiment_forecast::models::FittedSarimax;
use sentiment_forecast::service::ForecastService;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sentiment Forecast: Chained Forecasting Example");
    println!("===============================================\n");

    // Synthesize a year of merged price + sentiment history
    println!("Creating sample data...");
    let last_date = NaiveDate::from_ymd_opt(2024, 1, 10).ok_or("bad date")?;
    let history = create_sample_history(last_date, 365)?;
    let last = history[history.len() - 1];
    println!(
        "Sample data created: {} days ending {}\n",
        history.len(),
        last.date
    );

    // Fitted-model artifacts normally come from the offline training step;
    // here we build them in memory with hand-picked parameters.
    let beta = 20.0;
    let driver = FittedSarimax {
        name: "ewma AR(1)".to_string(),
        ar: vec![0.65],
        ma: vec![],
        seasonal_ar: vec![],
        seasonal_ma: vec![],
        seasonal_period: 0,
        diff: 0,
        seasonal_diff: 0,
        intercept: 0.0,
        exog_coef: vec![],
        sigma2: 0.01,
        recent_diffed: vec![last.ewma_sentiment],
        recent_residuals: vec![],
        recent_levels: vec![],
    };
    let target = FittedSarimax {
        name: "close random walk ~ ewma".to_string(),
        ar: vec![],
        ma: vec![],
        seasonal_ar: vec![],
        seasonal_ma: vec![],
        seasonal_period: 0,
        diff: 1,
        seasonal_diff: 0,
        intercept: 0.05,
        exog_coef: vec![beta],
        sigma2: 2.0,
        recent_diffed: vec![0.0],
        recent_residuals: vec![],
        recent_levels: vec![last.close - beta * last.ewma_sentiment],
    };

    let service = ForecastService::new(driver, target, DataLoader::from_records(history)?)?;

    // Forecast three weeks ahead
    let target_date = last_date + Duration::days(21);
    println!("Forecasting through {}...\n", target_date);
    let outcome = service.forecast_to(target_date)?;

    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10}",
        "date", "close", "ewma", "lower", "upper"
    );
    for row in outcome.table.rows() {
        println!(
            "{:<12} {:>10.2} {:>10.4} {:>10.2} {:>10.2}",
            row.date, row.predicted_close, row.predicted_ewma, row.lower_ci, row.upper_ci
        );
    }

    println!("\nSelected row for {}:", target_date);
    println!(
        "  predicted close {:.2}, 95% interval {:.2} - {:.2}, sentiment {}",
        outcome.selected.predicted_close,
        outcome.selected.lower_ci,
        outcome.selected.upper_ci,
        outcome.sentiment
    );

    Ok(())
}

fn create_sample_history(
    last_date: NaiveDate,
    days: usize,
) -> Result<Vec<HistoricalRecord>, Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let price_noise = Normal::new(0.0, 1.2)?;
    let sentiment_noise = Normal::new(0.0, 0.25)?;

    let start = last_date - Duration::days(days as i64 - 1);

    let mut closes = Vec::with_capacity(days);
    let mut level = 250.0;
    for _ in 0..days {
        level += 0.08 + price_noise.sample(&mut rng);
        closes.push(level);
    }

    let raw_sentiment: Vec<f64> = (0..days)
        .map(|_| sentiment_noise.sample(&mut rng))
        .collect();
    let smoothed = ewma(&raw_sentiment, 3)?;

    Ok((0..days)
        .map(|i| HistoricalRecord {
            date: start + Duration::days(i as i64),
            close: closes[i],
            ewma_sentiment: smoothed[i],
        })
        .collect())
}
