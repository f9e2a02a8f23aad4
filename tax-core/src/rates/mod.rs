pub mod cache;
pub mod factory;
pub mod provider;

pub use cache::RateCache;
pub use factory::{ProviderConfig, RateProviderFactory, RateProviderRegistry, StaticRateProviderFactory};
pub use provider::{ExchangeRateProvider, RateProviderError, StaticRateProvider};
