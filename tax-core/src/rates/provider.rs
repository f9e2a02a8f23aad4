use async_trait::async_trait;
use thiserror::Error;

use crate::models::ExchangeRates;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateProviderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of exchange rates against the base currency.
///
/// Implementations may hit the network, read a file or serve a fixed table.
/// The calculation engine never calls a provider itself; callers fetch a
/// snapshot and pass it in.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    async fn fetch_rates(&self) -> Result<ExchangeRates, RateProviderError>;
}

/// Serves the same in-memory table on every fetch.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    rates: ExchangeRates,
}

impl StaticRateProvider {
    pub fn new(rates: ExchangeRates) -> Self {
        Self { rates }
    }
}

#[async_trait]
impl ExchangeRateProvider for StaticRateProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_rates(&self) -> Result<ExchangeRates, RateProviderError> {
        Ok(self.rates.clone())
    }
}
