use anyhow::Result;
use std::collections::HashMap;

pub mod abstract_client;
pub use abstract_client::AbstractApiClient;

/// Fixed pause after every successful request, for rate-limit cooperation
/// with the remote service. Not configurable.
pub const REQUEST_PAUSE_SECS: u64 = 3;

/// Per-request network timeout.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// One day's worth of rates, keyed by currency code.
#[derive(Debug, Clone)]
pub struct RateColumn {
    pub date: String,
    pub rates: HashMap<String, f64>,
}

/// Common trait for historical exchange-rate providers
#[async_trait::async_trait]
pub trait RateProvider {
    /// Rates for a single date. `targets` is the comma-joined currency list;
    /// the endpoint serves one date per request.
    async fn historical_rates(&self, base: &str, date: &str, targets: &str) -> Result<RateColumn>;
}
