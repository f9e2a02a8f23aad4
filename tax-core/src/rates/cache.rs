use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::provider::{ExchangeRateProvider, RateProviderError};
use crate::models::{CurrencyCode, ExchangeRates};

/// Keeps the last exchange-rate table a provider returned.
///
/// Until the first successful refresh, [`current`](Self::current) hands out a
/// loading table so the engine reports conversions as unavailable. A failed
/// refresh keeps serving the previous table.
#[derive(Debug, Clone)]
pub struct RateCache {
    base_currency: CurrencyCode,
    max_age: Duration,
    snapshot: Option<ExchangeRates>,
}

impl RateCache {
    pub fn new(
        base_currency: CurrencyCode,
        max_age: Duration,
    ) -> Self {
        Self {
            base_currency,
            max_age,
            snapshot: None,
        }
    }

    /// The table to compute with right now.
    pub fn current(&self) -> ExchangeRates {
        match &self.snapshot {
            Some(rates) => rates.clone(),
            None => ExchangeRates::loading(self.base_currency.clone()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Whether the cached table is missing or older than the freshness window.
    pub fn is_stale(
        &self,
        now: DateTime<Utc>,
    ) -> bool {
        match self.snapshot.as_ref().and_then(ExchangeRates::fetched_at) {
            Some(fetched_at) => now - fetched_at > self.max_age,
            None => true,
        }
    }

    /// Fetches a fresh table from `provider`, stamping it with `now`.
    ///
    /// On failure the previous table stays in place and the error is returned.
    pub async fn refresh(
        &mut self,
        provider: &dyn ExchangeRateProvider,
        now: DateTime<Utc>,
    ) -> Result<(), RateProviderError> {
        match provider.fetch_rates().await {
            Ok(rates) => {
                info!(
                    provider = provider.name(),
                    currencies = rates.currencies().len(),
                    "exchange rates refreshed"
                );
                self.snapshot = Some(rates.with_fetched_at(now));
                Ok(())
            }
            Err(error) => {
                warn!(
                    provider = provider.name(),
                    %error,
                    cached = self.snapshot.is_some(),
                    "exchange rate refresh failed"
                );
                Err(error)
            }
        }
    }

    /// Refreshes only when the cached table is stale.
    pub async fn refresh_if_stale(
        &mut self,
        provider: &dyn ExchangeRateProvider,
        now: DateTime<Utc>,
    ) -> Result<bool, RateProviderError> {
        if !self.is_stale(now) {
            return Ok(false);
        }
        self.refresh(provider, now).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::rates::StaticRateProvider;

    struct FailingProvider;

    #[async_trait]
    impl ExchangeRateProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch_rates(&self) -> Result<ExchangeRates, RateProviderError> {
            Err(RateProviderError::Fetch("offline".to_string()))
        }
    }

    fn eur() -> CurrencyCode {
        CurrencyCode::parse("EUR").unwrap()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn provider() -> StaticRateProvider {
        StaticRateProvider::new(ExchangeRates::new(CurrencyCode::base()).with_rate(eur(), dec!(4.97)))
    }

    #[test]
    fn empty_cache_serves_loading_table() {
        let cache = RateCache::new(CurrencyCode::base(), Duration::hours(1));

        let rates = cache.current();

        assert!(rates.is_loading());
        assert_eq!(rates.rate(&eur()), None);
        assert!(cache.is_stale(noon()));
    }

    #[tokio::test]
    async fn refresh_stores_stamped_table() {
        let mut cache = RateCache::new(CurrencyCode::base(), Duration::hours(1));

        cache.refresh(&provider(), noon()).await.unwrap();

        let rates = cache.current();
        assert!(cache.is_loaded());
        assert_eq!(rates.rate(&eur()), Some(dec!(4.97)));
        assert_eq!(rates.fetched_at(), Some(noon()));
    }

    #[tokio::test]
    async fn cache_goes_stale_after_window() {
        let mut cache = RateCache::new(CurrencyCode::base(), Duration::hours(1));
        cache.refresh(&provider(), noon()).await.unwrap();

        assert!(!cache.is_stale(noon() + Duration::minutes(59)));
        assert!(cache.is_stale(noon() + Duration::minutes(61)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_table() {
        let mut cache = RateCache::new(CurrencyCode::base(), Duration::hours(1));
        cache.refresh(&provider(), noon()).await.unwrap();

        let result = cache.refresh(&FailingProvider, noon() + Duration::hours(2)).await;

        assert_eq!(result, Err(RateProviderError::Fetch("offline".to_string())));
        assert_eq!(cache.current().rate(&eur()), Some(dec!(4.97)));
    }

    #[tokio::test]
    async fn refresh_if_stale_skips_fresh_table() {
        let mut cache = RateCache::new(CurrencyCode::base(), Duration::hours(1));

        assert_eq!(cache.refresh_if_stale(&provider(), noon()).await, Ok(true));
        assert_eq!(
            cache.refresh_if_stale(&FailingProvider, noon() + Duration::minutes(5)).await,
            Ok(false)
        );
    }
}
