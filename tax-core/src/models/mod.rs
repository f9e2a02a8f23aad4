mod currency;
mod entity_type;
mod exchange_rates;
mod income_interval;
mod input_snapshot;
mod rule_book;
mod tax_result;
mod tax_year_config;

pub use currency::{BASE_CURRENCY, CurrencyCode, CurrencyCodeError};
pub use entity_type::EntityType;
pub use exchange_rates::ExchangeRates;
pub use income_interval::IncomeInterval;
pub use input_snapshot::InputSnapshot;
pub use rule_book::RuleBook;
pub use tax_result::{TaxComparison, TaxResult};
pub use tax_year_config::{ConfigError, ContributionRule, ContributionTier, TaxYearConfig};
