use clap::Parser;
use sentiment_forecast::error::Result;
use sentiment_forecast::service::ForecastService;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Forecast closing prices from a sentiment-driven SARIMAX chain"
)]
struct Args {
    /// CSV file with historical closing prices and EWMA sentiment
    #[arg(short, long)]
    data: PathBuf,

    /// Fitted model artifact for the sentiment-EWMA series
    #[arg(long)]
    ewma_model: PathBuf,

    /// Fitted model artifact for the closing-price series
    #[arg(long)]
    stock_model: PathBuf,

    /// Target date to forecast through (YYYY-MM-DD)
    #[arg(short = 'D', long)]
    date: String,

    /// Print every row of the forecast horizon
    #[arg(long)]
    full_table: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(err) = run(&args) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let service = ForecastService::load(&args.ewma_model, &args.stock_model, &args.data)?;

    println!("Last available data: {}", service.historical().last_date());

    let outcome = service.forecast_to_str(&args.date)?;
    let selected = &outcome.selected;

    println!("\nForecast for {}", selected.date);
    println!("  Predicted close:     {:.2}", selected.predicted_close);
    println!(
        "  95% interval:        {:.2} - {:.2}",
        selected.lower_ci, selected.upper_ci
    );
    println!(
        "  Predicted sentiment: {:.4} ({})",
        selected.predicted_ewma, outcome.sentiment
    );

    if args.full_table {
        println!("\n{:<12} {:>10} {:>10} {:>10} {:>10}", "date", "close", "ewma", "lower", "upper");
        for row in outcome.table.rows() {
            println!(
                "{:<12} {:>10.2} {:>10.4} {:>10.2} {:>10.2}",
                row.date, row.predicted_close, row.predicted_ewma, row.lower_ci, row.upper_ci
            );
        }
    }

    Ok(())
}
