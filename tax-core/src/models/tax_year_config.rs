use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CurrencyCode;

/// Errors raised when a tax-year rule set is internally inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be between 0 and 1, got {value}")]
    InvalidRate { name: &'static str, value: Decimal },

    #[error("reference wage must be positive, got {0}")]
    InvalidReferenceWage(Decimal),

    #[error("VAT threshold must be non-negative, got {0}")]
    InvalidVatThreshold(Decimal),

    #[error("deductible expenses cap must be in (0, 1], got {0}")]
    InvalidExpensesCap(Decimal),

    #[error("{0} contribution tiers must have strictly ascending thresholds")]
    UnorderedTiers(&'static str),

    #[error("base currency {0} is missing from the supported currencies")]
    BaseCurrencyNotSupported(CurrencyCode),
}

/// One step of a fixed contribution schedule.
///
/// Once annual income reaches `threshold_wages` reference wages, the
/// contribution is computed on `base_wages` reference wages regardless of
/// how much the income exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionTier {
    pub threshold_wages: u32,
    pub base_wages: u32,
}

/// A social contribution paid as a fixed amount per income tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRule {
    pub rate: Decimal,
    /// Sorted by `threshold_wages`, ascending.
    pub tiers: Vec<ContributionTier>,
}

/// Tax constants for a single tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    pub base_currency: CurrencyCode,
    pub currencies: Vec<CurrencyCode>,
    /// Monthly minimum gross wage, in the base currency.
    pub reference_wage: Decimal,
    pub pension: ContributionRule,
    pub health: ContributionRule,
    pub income_tax_rate: Decimal,
    pub revenue_tax_rate: Decimal,
    pub profit_tax_rate: Decimal,
    /// Annual, in the base currency.
    pub vat_threshold: Decimal,
    /// Fraction of gross income deductible expenses are capped at.
    #[serde(default)]
    pub deductible_expenses_cap: Option<Decimal>,
}

impl TaxYearConfig {
    /// Rules in force for tax year 2023.
    pub fn builtin_2023() -> Self {
        let currencies = ["RON", "EUR", "USD", "GBP", "CHF"]
            .into_iter()
            .filter_map(|code| CurrencyCode::parse(code).ok())
            .collect();

        Self {
            tax_year: 2023,
            base_currency: CurrencyCode::base(),
            currencies,
            reference_wage: dec!(3000),
            pension: ContributionRule {
                rate: dec!(0.25),
                tiers: vec![
                    ContributionTier { threshold_wages: 12, base_wages: 12 },
                    ContributionTier { threshold_wages: 24, base_wages: 24 },
                ],
            },
            health: ContributionRule {
                rate: dec!(0.10),
                tiers: vec![
                    ContributionTier { threshold_wages: 6, base_wages: 6 },
                    ContributionTier { threshold_wages: 12, base_wages: 12 },
                    ContributionTier { threshold_wages: 24, base_wages: 24 },
                ],
            },
            income_tax_rate: dec!(0.10),
            revenue_tax_rate: dec!(0.03),
            profit_tax_rate: dec!(0.16),
            vat_threshold: dec!(300000),
            deductible_expenses_cap: None,
        }
    }

    pub fn supports(
        &self,
        currency: &CurrencyCode,
    ) -> bool {
        self.currencies.contains(currency)
    }

    /// Checks every constant is within its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("pension rate", self.pension.rate),
            ("health rate", self.health.rate),
            ("income tax rate", self.income_tax_rate),
            ("revenue tax rate", self.revenue_tax_rate),
            ("profit tax rate", self.profit_tax_rate),
        ];
        for (name, value) in rates {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        if self.reference_wage <= Decimal::ZERO {
            return Err(ConfigError::InvalidReferenceWage(self.reference_wage));
        }
        if self.vat_threshold < Decimal::ZERO {
            return Err(ConfigError::InvalidVatThreshold(self.vat_threshold));
        }
        if let Some(cap) = self.deductible_expenses_cap {
            if cap <= Decimal::ZERO || cap > Decimal::ONE {
                return Err(ConfigError::InvalidExpensesCap(cap));
            }
        }
        if !tiers_ascending(&self.pension.tiers) {
            return Err(ConfigError::UnorderedTiers("pension"));
        }
        if !tiers_ascending(&self.health.tiers) {
            return Err(ConfigError::UnorderedTiers("health"));
        }
        if !self.supports(&self.base_currency) {
            return Err(ConfigError::BaseCurrencyNotSupported(
                self.base_currency.clone(),
            ));
        }
        Ok(())
    }
}

fn tiers_ascending(tiers: &[ContributionTier]) -> bool {
    tiers
        .windows(2)
        .all(|pair| pair[0].threshold_wages < pair[1].threshold_wages)
}
