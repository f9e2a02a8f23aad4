use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CurrencyCode;

/// Conversion rates against a base currency, as last seen by a provider.
///
/// Each rate is the number of base-currency units one unit of the currency
/// is worth. While `loading` is set every non-base lookup yields `None`,
/// exactly as if the currency were absent from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRates {
    base_currency: CurrencyCode,
    rates: HashMap<CurrencyCode, Decimal>,
    loading: bool,
    fetched_at: Option<DateTime<Utc>>,
}

impl ExchangeRates {
    /// An empty, loaded table.
    pub fn new(base_currency: CurrencyCode) -> Self {
        Self {
            base_currency,
            rates: HashMap::new(),
            loading: false,
            fetched_at: None,
        }
    }

    /// A table whose rates have not arrived yet.
    pub fn loading(base_currency: CurrencyCode) -> Self {
        Self {
            loading: true,
            ..Self::new(base_currency)
        }
    }

    pub fn with_rate(
        mut self,
        currency: CurrencyCode,
        rate: Decimal,
    ) -> Self {
        self.insert(currency, rate);
        self
    }

    pub fn with_fetched_at(
        mut self,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }

    pub fn insert(
        &mut self,
        currency: CurrencyCode,
        rate: Decimal,
    ) {
        self.rates.insert(currency, rate);
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Currencies with a known rate, sorted by code.
    pub fn currencies(&self) -> Vec<&CurrencyCode> {
        let mut codes: Vec<_> = self.rates.keys().collect();
        codes.sort_unstable();
        codes
    }

    /// Rate for `currency`, or `None` when it is not available yet.
    ///
    /// The base currency always converts at 1. Zero or negative rates are
    /// treated as unknown.
    pub fn rate(
        &self,
        currency: &CurrencyCode,
    ) -> Option<Decimal> {
        if *currency == self.base_currency {
            return Some(Decimal::ONE);
        }
        if self.loading {
            return None;
        }
        self.rates
            .get(currency)
            .copied()
            .filter(|rate| *rate > Decimal::ZERO)
    }

    /// Converts `amount` of `currency` into the base currency.
    ///
    /// `None` when the rate is unknown or the product does not fit a `Decimal`.
    pub fn to_base(
        &self,
        amount: Decimal,
        currency: &CurrencyCode,
    ) -> Option<Decimal> {
        self.rate(currency)?.checked_mul(amount)
    }

    /// Converts a base-currency `amount` into `currency`.
    pub fn from_base(
        &self,
        amount: Decimal,
        currency: &CurrencyCode,
    ) -> Option<Decimal> {
        amount.checked_div(self.rate(currency)?)
    }
}
