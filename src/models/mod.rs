use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;
use tracing::warn;

/// The base currency all rates are quoted against.
pub const BASE_CURRENCY: &str = "USD";

/// Currency codes pulled when no targets are given on the command line.
pub const DEFAULT_TARGETS: &str = "CAD,EUR,HKD,PHP";

/// Wire and table date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DEFAULT_ENDPOINT: &str = "https://exchange-rates.abstractapi.com/v1/historical";
const DEFAULT_TABLE_PATH: &str = "exchange_rates_table.csv";

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub table_path: String,
    pub endpoint: String,
}

impl Config {
    /// Load configuration from environment variables. The API key is resolved
    /// here, before any fetch runs, so a missing credential fails the job
    /// without burning part of the date range.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Config {
            api_key: std::env::var("ABSTRACTAPI_API_KEY")
                .map_err(|_| anyhow::anyhow!("ABSTRACTAPI_API_KEY environment variable required"))?,
            table_path: std::env::var("FX_TABLE_PATH")
                .unwrap_or_else(|_| DEFAULT_TABLE_PATH.to_string()),
            endpoint: std::env::var("ABSTRACTAPI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
        })
    }
}

/// Inclusive date range driving a collection run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a validated range. A start after the end is corrected to one day
    /// before the end, with a warning, rather than rejected.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start > end {
            let corrected = end - Duration::days(1);
            warn!(
                "Start date {} is after end date {}; setting the start date to {}",
                start, end, corrected
            );
            Self { start: corrected, end }
        } else {
            Self { start, end }
        }
    }

    pub fn days_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every calendar day from start to end inclusive, formatted `YYYY-MM-DD`.
    /// Lexicographic order of the strings is chronological order.
    pub fn dates(&self) -> BTreeSet<String> {
        let mut dates = BTreeSet::new();
        let mut day = self.start;
        while day <= self.end {
            dates.insert(day.format(DATE_FORMAT).to_string());
            day += Duration::days(1);
        }
        dates
    }
}

/// Split a comma-separated target list into a set of distinct currency codes.
pub fn parse_targets(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .collect()
}

/// Outcome of one collection run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Targets not yet present in the table; reported for a manual backfill.
    pub new_targets: BTreeSet<String>,
    /// Dates actually fetched this run, ascending.
    pub fetched_dates: Vec<String>,
    /// Column count of the table after the run.
    pub total_columns: usize,
}
