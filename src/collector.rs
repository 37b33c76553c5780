use anyhow::Result;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

use crate::api::RateProvider;
use crate::diff;
use crate::models::{BASE_CURRENCY, DateRange, RunSummary};
use crate::table::RateTable;

/// Drives one collection run: diff the requested range and targets against
/// the persisted table, fetch the missing dates one request at a time, and
/// merge the results back into the file.
pub struct RateCollector<P: RateProvider> {
    provider: P,
    table_path: PathBuf,
}

impl<P: RateProvider> RateCollector<P> {
    pub fn new(provider: P, table_path: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            table_path: table_path.into(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn run(&self, range: &DateRange, targets: &BTreeSet<String>) -> Result<RunSummary> {
        let date_range = range.dates();
        let existing = RateTable::read_csv(&self.table_path)?;

        let new_targets = diff::missing_targets(targets, &existing.row_set());
        let dates_to_fetch = diff::missing_dates(&date_range, &existing.column_set());

        if dates_to_fetch.is_empty() {
            info!("Table at {} is already up to date", self.table_path.display());
            return Ok(RunSummary {
                new_targets,
                fetched_dates: Vec::new(),
                total_columns: existing.column_labels().len(),
            });
        }

        let joined_targets: Vec<&str> = targets.iter().map(String::as_str).collect();
        let new_data = self.aggregate(&dates_to_fetch, &joined_targets.join(",")).await?;

        // Re-read in full, then overwrite the file wholesale. No locking: a
        // single run at a time is the operator's responsibility.
        let mut merged = RateTable::read_csv(&self.table_path)?;
        merged.append_columns(&new_data);
        merged.write_csv(&self.table_path)?;

        info!(
            "Table updated: {} new column(s), {} column(s) total",
            dates_to_fetch.len(),
            merged.column_labels().len()
        );

        Ok(RunSummary {
            new_targets,
            fetched_dates: dates_to_fetch.into_iter().collect(),
            total_columns: merged.column_labels().len(),
        })
    }

    /// One request per missing date, strictly sequential and ascending; the
    /// endpoint serves a single date at a time. The first failure aborts the
    /// whole run with nothing persisted.
    async fn aggregate(&self, dates: &BTreeSet<String>, targets: &str) -> Result<RateTable> {
        let mut new_data = RateTable::new();
        for date in dates {
            let column = self
                .provider
                .historical_rates(BASE_CURRENCY, date, targets)
                .await?;
            new_data.push_column(&column.date, &column.rates);
        }
        Ok(new_data)
    }
}
