use anyhow::{Result, anyhow};
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use std::time::Instant;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use fx_rates::api::AbstractApiClient;
use fx_rates::collector::RateCollector;
use fx_rates::models::{Config, DATE_FORMAT, DEFAULT_TARGETS, DateRange, parse_targets};

/// Update a persisted table of historical exchange rates
#[derive(Parser)]
#[command(name = "fx-rates")]
#[command(version = "0.1.0")]
#[command(about = "Fetch historical exchange rates and merge them into a CSV table")]
struct Args {
    /// Date from which to start pulling historical data, inclusive
    /// (YYYY-MM-DD). Defaults to yesterday.
    #[arg(long = "start_date", short = 's')]
    start_date: Option<String>,

    /// Date at which to stop pulling historical data, inclusive
    /// (YYYY-MM-DD). Defaults to today.
    #[arg(long = "end_date", short = 'e')]
    end_date: Option<String>,

    /// Comma-separated currency codes to pull historical data for.
    #[arg(long, short = 't', default_value = DEFAULT_TARGETS)]
    targets: String,
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| anyhow!("invalid {} {:?} (expected YYYY-MM-DD): {}", field, raw, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter("fx_rates=info")
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let today = Local::now().date_naive();
    let start = match &args.start_date {
        Some(raw) => parse_date(raw, "start date")?,
        None => today - Duration::days(1),
    };
    let end = match &args.end_date {
        Some(raw) => parse_date(raw, "end date")?,
        None => today,
    };
    let range = DateRange::new(start, end);
    let targets = parse_targets(&args.targets);

    // Credential resolved before the fetch loop; a missing key fails here.
    let config = Config::from_env()?;
    let client = AbstractApiClient::new(&config)?;
    let collector = RateCollector::new(client, &config.table_path);

    info!(
        "Starting to pull historical data for {:?} between {} and {}",
        targets, range.start, range.end
    );
    let started = Instant::now();

    let summary = collector.run(&range, &targets).await?;

    info!(
        "Job complete: {} date(s) fetched, table now has {} date column(s)",
        summary.fetched_dates.len(),
        summary.total_columns
    );
    info!("Finished the job in {:.1}s", started.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_iso_format() {
        let date = parse_date("2024-01-05", "start date").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("20240105", "start date").is_err());
        assert!(parse_date("2024-13-01", "start date").is_err());
        assert!(parse_date("05-01-2024", "end date").is_err());
    }
}
