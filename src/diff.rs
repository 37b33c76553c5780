use std::collections::{BTreeSet, HashSet};
use tracing::{info, warn};

/// Targets not yet present as table rows. Informational only: new currencies
/// are reported for a manual backfill, never expanded into a wider fetch.
pub fn missing_targets(
    requested: &BTreeSet<String>,
    existing_rows: &HashSet<String>,
) -> BTreeSet<String> {
    let missing: BTreeSet<String> = requested
        .iter()
        .filter(|code| !existing_rows.contains(code.as_str()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        warn!("New targets have been added and will need to be backfilled: {:?}", missing);
    }
    missing
}

/// Dates in the requested range not yet present as table columns. This set,
/// and only this set, drives the fetch loop.
pub fn missing_dates(
    date_range: &BTreeSet<String>,
    existing_columns: &HashSet<String>,
) -> BTreeSet<String> {
    let missing: BTreeSet<String> = date_range
        .iter()
        .filter(|date| !existing_columns.contains(date.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        info!("All requested dates are already present in the table");
    } else {
        info!("Pulling historical data for the following dates: {:?}", missing);
    }
    missing
}
