pub mod calculations;
pub mod models;
pub mod rates;

pub use calculations::{TaxCalculator, compare, compute};
pub use models::*;
pub use rates::{ExchangeRateProvider, RateProviderError};
