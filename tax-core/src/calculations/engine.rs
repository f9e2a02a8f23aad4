//! The tax calculation engine.
//!
//! [`TaxCalculator`] turns an [`InputSnapshot`] plus the current
//! [`ExchangeRates`] into a [`TaxResult`]. It is a pure function of its
//! inputs and performs no I/O. Callers re-run it whenever the snapshot or
//! the rates change.
//!
//! # Steps
//!
//! 1. Convert income and expenses into the base currency.
//! 2. Annualize the base-currency income for threshold checks.
//! 3. Apply the entity-type formula (see [`entity_taxes`](super::entity_taxes)).
//! 4. Derive totals, net income and percentages.
//! 5. Compare the annual income with the VAT registration threshold.
//!
//! Missing exchange rates never fail the computation; every figure depending
//! on them is `None` while the others are still filled in.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::TaxCalculator;
//! use tax_core::{CurrencyCode, EntityType, ExchangeRates, InputSnapshot, TaxYearConfig};
//!
//! let config = TaxYearConfig::builtin_2023();
//! let rates = ExchangeRates::new(CurrencyCode::base());
//! let input = InputSnapshot::in_base_currency(dec!(20000), dec!(25000), EntityType::LlcProfitBased);
//!
//! let result = TaxCalculator::new(&config).compute(&input, &rates);
//!
//! assert_eq!(result.total_tax_amount_in_base_currency, Some(dec!(0)));
//! assert_eq!(result.net_income, Some(dec!(-5000)));
//! ```

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::common::percentage;
use crate::calculations::entity_taxes::{NormalizedAmounts, breakdown};
use crate::models::{
    CurrencyCode, EntityType, ExchangeRates, InputSnapshot, TaxComparison, TaxResult,
    TaxYearConfig,
};

/// Computes a [`TaxResult`] for a single entity type.
///
/// Shorthand for `TaxCalculator::new(config).compute(input, rates)`.
pub fn compute(
    input: &InputSnapshot,
    rates: &ExchangeRates,
    config: &TaxYearConfig,
) -> TaxResult {
    TaxCalculator::new(config).compute(input, rates)
}

/// Computes one [`TaxResult`] per entity type, in the order given.
///
/// The snapshot's own `entity_type` is ignored.
pub fn compare(
    input: &InputSnapshot,
    rates: &ExchangeRates,
    config: &TaxYearConfig,
    entity_types: &[EntityType],
) -> TaxComparison {
    TaxCalculator::new(config).compare(input, rates, entity_types)
}

/// Calculator bound to one tax year's rules.
#[derive(Debug, Clone, Copy)]
pub struct TaxCalculator<'a> {
    config: &'a TaxYearConfig,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a TaxYearConfig {
        self.config
    }

    /// Runs every step for the snapshot's entity type.
    pub fn compute(
        &self,
        input: &InputSnapshot,
        rates: &ExchangeRates,
    ) -> TaxResult {
        let multiplier = input.income_interval.multiplier();

        // Step 1: currency normalization
        let gross_base = self.to_base(input.gross_income, &input.income_currency, rates);
        let expenses_base = self.to_base(
            input.deductible_expenses,
            &input.deductible_expenses_currency,
            rates,
        );

        // Step 2: interval normalization
        let annual_gross_base = gross_base.and_then(|g| g.checked_mul(multiplier));

        // Step 3: entity-type formula
        let amounts = NormalizedAmounts {
            gross_income: gross_base,
            deductible_expenses: expenses_base,
            annual_multiplier: multiplier,
        };
        let taxes = breakdown(input.entity_type, self.config, &amounts);
        let total_tax = taxes.total();

        // Step 4: net income and percentages
        let net_base = gross_base
            .zip(total_tax)
            .zip(taxes.retained_expenses)
            .and_then(|((gross, tax), retained)| gross.checked_sub(tax)?.checked_sub(retained));
        let net_income = net_base.and_then(|net| {
            self.from_base(net, &input.income_currency, rates)
        });

        // Step 5: VAT registration threshold; an annual figure too large to
        // represent is over any threshold.
        let over_vat = gross_base.is_some_and(|gross| {
            gross
                .checked_mul(multiplier)
                .is_none_or(|annual| annual > self.config.vat_threshold)
        });

        debug!(
            entity_type = %input.entity_type,
            tax_year = self.config.tax_year,
            gross_base = ?gross_base,
            expenses_base = ?expenses_base,
            total_tax = ?total_tax,
            net_base = ?net_base,
            over_vat,
            "computed tax result"
        );

        TaxResult {
            entity_type: input.entity_type,
            tax_year: self.config.tax_year,
            income_interval: input.income_interval,
            gross_income: input.gross_income,
            income_currency: input.income_currency.clone(),
            deductible_expenses: input.deductible_expenses,
            deductible_expenses_currency: input.deductible_expenses_currency.clone(),
            gross_income_in_base_currency: gross_base,
            annual_gross_income_in_base_currency: annual_gross_base,
            deductible_expenses_in_base_currency: expenses_base,
            pension_tax_amount_in_base_currency: taxes.pension,
            health_tax_amount_in_base_currency: taxes.health,
            income_tax_amount_in_base_currency: taxes.income_tax,
            total_tax_amount_in_base_currency: total_tax,
            total_tax_percentage: percentage(total_tax, gross_base),
            net_income,
            total_net_income_in_base_currency: net_base,
            total_net_tax_percentage: percentage(net_base, gross_base),
            total_deductible_expenses_percentage: percentage(expenses_base, gross_base),
            gross_income_over_vat_threshold: over_vat,
        }
    }

    /// Runs [`compute`](Self::compute) once per entity type.
    pub fn compare(
        &self,
        input: &InputSnapshot,
        rates: &ExchangeRates,
        entity_types: &[EntityType],
    ) -> TaxComparison {
        let results = entity_types
            .iter()
            .map(|entity_type| self.compute(&input.with_entity_type(*entity_type), rates))
            .collect();

        TaxComparison { results }
    }

    /// Converts an amount into the base currency of the rule set.
    ///
    /// Zero needs no rate. Rates quoted against another base are unusable.
    fn to_base(
        &self,
        amount: Decimal,
        currency: &CurrencyCode,
        rates: &ExchangeRates,
    ) -> Option<Decimal> {
        if *currency == self.config.base_currency || amount.is_zero() {
            return Some(amount);
        }
        if !self.rates_usable(rates) {
            return None;
        }
        let converted = rates.to_base(amount, currency);
        if converted.is_none() {
            debug!(currency = %currency, loading = rates.is_loading(), "exchange rate not available");
        }
        converted
    }

    fn from_base(
        &self,
        amount: Decimal,
        currency: &CurrencyCode,
        rates: &ExchangeRates,
    ) -> Option<Decimal> {
        if *currency == self.config.base_currency {
            return Some(amount);
        }
        if !self.rates_usable(rates) {
            return None;
        }
        rates.from_base(amount, currency)
    }

    fn rates_usable(
        &self,
        rates: &ExchangeRates,
    ) -> bool {
        if *rates.base_currency() != self.config.base_currency {
            warn!(
                rates_base = %rates.base_currency(),
                config_base = %self.config.base_currency,
                "exchange rates quoted against a different base currency; ignoring them"
            );
            return false;
        }
        true
    }
}
