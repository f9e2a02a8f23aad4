use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::provider::{ExchangeRateProvider, RateProviderError, StaticRateProvider};
use crate::models::{CurrencyCode, ExchangeRates};

/// Backend-agnostic provider configuration.
///
/// `backend` must match the [`RateProviderFactory::backend_name`] of a
/// registered factory.  `source` is passed through to that factory
/// unchanged; its meaning is backend-specific.
///
/// | backend  | source examples              |
/// |----------|------------------------------|
/// | `static` | `EUR=4.97;USD=4.61`, empty   |
/// | `csv`    | `rates.csv`                  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"static"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub source: String,
    /// Currency the rates are quoted against.
    pub base_currency: CurrencyCode,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: "static".to_string(),
            source: String::new(),
            base_currency: CurrencyCode::base(),
        }
    }
}

/// One implementation per rate source.  Each source exports a single unit
/// struct that implements this trait and is registered with a
/// [`RateProviderRegistry`] at startup.
#[async_trait]
pub trait RateProviderFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Build a ready-to-use provider from `config`.
    async fn create(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn ExchangeRateProvider>, RateProviderError>;
}

/// Registry of [`RateProviderFactory`] instances, keyed by backend name.
///
/// Typical lifetime:
/// 1. Create with `RateProviderRegistry::new()`.
/// 2. Call `register` once per known backend.
/// 3. Call `create` whenever a provider is needed.
pub struct RateProviderRegistry {
    factories: HashMap<&'static str, Box<dyn RateProviderFactory>>,
}

impl RateProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory.
    ///
    /// If a factory with the same [`RateProviderFactory::backend_name`] is
    /// already present it is silently replaced.
    pub fn register(
        &mut self,
        factory: Box<dyn RateProviderFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend` and return
    /// the provider it produces.
    ///
    /// # Errors
    /// * [`RateProviderError::Configuration`] if no factory is registered for
    ///   the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn ExchangeRateProvider>, RateProviderError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RateProviderError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RateProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a [`StaticRateProvider`] from an inline `CUR=rate` list.
///
/// Pairs are separated by `;` or `,`. An empty source yields a provider
/// that only knows the base currency.
pub struct StaticRateProviderFactory;

impl StaticRateProviderFactory {
    /// Parses `EUR=4.97;USD=4.61` into a rate table.
    pub fn parse_source(
        source: &str,
        base_currency: CurrencyCode,
    ) -> Result<ExchangeRates, RateProviderError> {
        let mut rates = ExchangeRates::new(base_currency);

        for pair in source
            .split([';', ','])
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            let (code, rate) = pair.split_once('=').ok_or_else(|| {
                RateProviderError::Parse(format!("expected CUR=rate, got '{pair}'"))
            })?;
            let code = CurrencyCode::parse(code)
                .map_err(|e| RateProviderError::Parse(e.to_string()))?;
            let rate: Decimal = rate
                .trim()
                .parse()
                .map_err(|e| RateProviderError::Parse(format!("invalid rate for {code}: {e}")))?;
            if rate <= Decimal::ZERO {
                return Err(RateProviderError::Parse(format!(
                    "rate for {code} must be positive, got {rate}"
                )));
            }
            rates.insert(code, rate);
        }

        Ok(rates)
    }
}

#[async_trait]
impl RateProviderFactory for StaticRateProviderFactory {
    fn backend_name(&self) -> &'static str {
        "static"
    }

    async fn create(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn ExchangeRateProvider>, RateProviderError> {
        let rates = Self::parse_source(&config.source, config.base_currency.clone())?;
        Ok(Box::new(StaticRateProvider::new(rates)))
    }
}
