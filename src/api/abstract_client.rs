use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{RateColumn, RateProvider, REQUEST_PAUSE_SECS, REQUEST_TIMEOUT_SECS};
use crate::models::Config;

/// AbstractAPI historical endpoint response body
#[derive(Debug, Deserialize)]
struct HistoricalRatesResponse {
    exchange_rates: HashMap<String, f64>,
}

/// AbstractAPI exchange-rates client
pub struct AbstractApiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl AbstractApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("fx-rates/1.0")
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait::async_trait]
impl RateProvider for AbstractApiClient {
    async fn historical_rates(&self, base: &str, date: &str, targets: &str) -> Result<RateColumn> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("api_key", self.api_key.as_str()),
                ("base", base),
                ("date", date),
                ("target", targets),
            ],
        )?;

        info!("Requesting rates for {} (base {}, targets {})", date, base, targets);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!(
                "rate lookup for {} failed with status {}: {}",
                date,
                status,
                error_text
            ));
        }

        let parsed: HistoricalRatesResponse = response.json().await?;
        debug!("Received {} rate(s) for {}", parsed.exchange_rates.len(), date);

        tokio::time::sleep(Duration::from_secs(REQUEST_PAUSE_SECS)).await;

        Ok(RateColumn {
            date: date.to_string(),
            rates: parsed.exchange_rates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_body_parsing() {
        let body = r#"{"base":"USD","date":"2024-01-04","exchange_rates":{"CAD":1.35,"EUR":0.91}}"#;
        let parsed: HistoricalRatesResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.exchange_rates.len(), 2);
        assert_eq!(parsed.exchange_rates["CAD"], 1.35);
    }

    #[test]
    fn test_missing_exchange_rates_field_is_an_error() {
        let body = r#"{"error":{"message":"quota exceeded"}}"#;
        assert!(serde_json::from_str::<HistoricalRatesResponse>(body).is_err());
    }
}
