//! Tax formulas per entity type.
//!
//! Every formula works on base-currency amounts for the entered income
//! interval. An amount that could not be converted yet arrives as `None` and
//! turns every component depending on it into `None`.
//!
//! | Entity type          | Pension / health          | Income tax                                   |
//! |----------------------|---------------------------|----------------------------------------------|
//! | Sole proprietorship  | fixed, by income tier     | rate × max(gross − contributions − expenses, 0) |
//! | Revenue-based LLC    | 0                         | rate × gross                                 |
//! | Profit-based LLC     | 0                         | rate × max(gross − expenses, 0)              |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::max;
use crate::calculations::contributions::annual_contribution;
use crate::models::{ContributionRule, EntityType, TaxYearConfig};

/// Base-currency amounts the formulas consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedAmounts {
    pub gross_income: Option<Decimal>,
    pub deductible_expenses: Option<Decimal>,
    /// Factor turning interval figures into yearly ones.
    pub annual_multiplier: Decimal,
}

/// Tax components for one entity type, in base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub pension: Option<Decimal>,
    pub health: Option<Decimal>,
    pub income_tax: Option<Decimal>,
    /// Expenses paid out of the income before what is left counts as net.
    pub retained_expenses: Option<Decimal>,
}

impl TaxBreakdown {
    /// Pension + health + income tax.
    pub fn total(&self) -> Option<Decimal> {
        self.pension?
            .checked_add(self.health?)?
            .checked_add(self.income_tax?)
    }
}

/// Applies the formula for `entity_type` to `amounts`.
pub fn breakdown(
    entity_type: EntityType,
    config: &TaxYearConfig,
    amounts: &NormalizedAmounts,
) -> TaxBreakdown {
    match entity_type {
        EntityType::SoleProprietorship => sole_proprietorship(config, amounts),
        EntityType::LlcRevenueBased => llc_revenue_based(config, amounts),
        EntityType::LlcProfitBased => llc_profit_based(config, amounts),
    }
}

/// Expenses that may be offset against `gross`, after the configured cap.
fn deductible_part(
    config: &TaxYearConfig,
    gross: Decimal,
    expenses: Decimal,
) -> Decimal {
    match config.deductible_expenses_cap {
        Some(cap) => expenses.min(max(gross.saturating_mul(cap), Decimal::ZERO)),
        None => expenses,
    }
}

fn sole_proprietorship(
    config: &TaxYearConfig,
    amounts: &NormalizedAmounts,
) -> TaxBreakdown {
    let multiplier = amounts.annual_multiplier;
    // Saturating is enough here: an income past `Decimal::MAX` a year is in
    // the top tier either way.
    let contribution = |rule: &ContributionRule| {
        amounts.gross_income.and_then(|gross| {
            let annual = gross.saturating_mul(multiplier);
            annual_contribution(rule, annual, config.reference_wage).checked_div(multiplier)
        })
    };

    let pension = contribution(&config.pension);
    let health = contribution(&config.health);

    let income_tax = taxable_after_contributions(config, amounts, pension, health)
        .and_then(|taxable| taxable.checked_mul(config.income_tax_rate));

    TaxBreakdown {
        pension,
        health,
        income_tax,
        retained_expenses: Some(Decimal::ZERO),
    }
}

fn taxable_after_contributions(
    config: &TaxYearConfig,
    amounts: &NormalizedAmounts,
    pension: Option<Decimal>,
    health: Option<Decimal>,
) -> Option<Decimal> {
    let gross = amounts.gross_income?;
    let expenses = deductible_part(config, gross, amounts.deductible_expenses?);
    let taxable = gross
        .checked_sub(pension?)?
        .checked_sub(health?)?
        .checked_sub(expenses)?;
    Some(max(taxable, Decimal::ZERO))
}

fn llc_revenue_based(
    config: &TaxYearConfig,
    amounts: &NormalizedAmounts,
) -> TaxBreakdown {
    let gross = amounts.gross_income;

    TaxBreakdown {
        pension: gross.map(|_| Decimal::ZERO),
        health: gross.map(|_| Decimal::ZERO),
        income_tax: gross.and_then(|g| g.checked_mul(config.revenue_tax_rate)),
        retained_expenses: Some(Decimal::ZERO),
    }
}

fn llc_profit_based(
    config: &TaxYearConfig,
    amounts: &NormalizedAmounts,
) -> TaxBreakdown {
    let gross = amounts.gross_income;
    let income_tax = gross.zip(amounts.deductible_expenses).and_then(|(g, e)| {
        let profit = max(g.checked_sub(deductible_part(config, g, e))?, Decimal::ZERO);
        profit.checked_mul(config.profit_tax_rate)
    });

    TaxBreakdown {
        pension: gross.map(|_| Decimal::ZERO),
        health: gross.map(|_| Decimal::ZERO),
        income_tax,
        retained_expenses: amounts.deductible_expenses,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn yearly(
        gross: Decimal,
        expenses: Decimal,
    ) -> NormalizedAmounts {
        NormalizedAmounts {
            gross_income: Some(gross),
            deductible_expenses: Some(expenses),
            annual_multiplier: Decimal::ONE,
        }
    }

    #[test]
    fn sole_proprietorship_reference_case() {
        let config = TaxYearConfig::builtin_2023();

        let result = breakdown(
            EntityType::SoleProprietorship,
            &config,
            &yearly(dec!(100000), dec!(10000)),
        );

        assert_eq!(result.pension, Some(dec!(18000)));
        assert_eq!(result.health, Some(dec!(7200)));
        // 10% of (100,000 - 18,000 - 7,200 - 10,000)
        assert_eq!(result.income_tax, Some(dec!(6480)));
        assert_eq!(result.total(), Some(dec!(31680)));
    }

    #[test]
    fn sole_proprietorship_monthly_spreads_fixed_contributions() {
        let config = TaxYearConfig::builtin_2023();
        let amounts = NormalizedAmounts {
            gross_income: Some(dec!(5000)),
            deductible_expenses: Some(Decimal::ZERO),
            annual_multiplier: dec!(12),
        };

        let result = breakdown(EntityType::SoleProprietorship, &config, &amounts);

        // 60,000 a year: pension on 12 wages, health on 12 wages
        assert_eq!(result.pension, Some(dec!(750)));
        assert_eq!(result.health, Some(dec!(300)));
        assert_eq!(result.income_tax, Some(dec!(395)));
    }

    #[test]
    fn sole_proprietorship_income_tax_floors_at_zero() {
        let config = TaxYearConfig::builtin_2023();

        let result = breakdown(
            EntityType::SoleProprietorship,
            &config,
            &yearly(dec!(40000), dec!(50000)),
        );

        assert_eq!(result.income_tax, Some(Decimal::ZERO));
        assert_eq!(result.pension, Some(dec!(9000)));
    }

    #[test]
    fn sole_proprietorship_contributions_known_without_expense_rate() {
        let config = TaxYearConfig::builtin_2023();
        let amounts = NormalizedAmounts {
            gross_income: Some(dec!(100000)),
            deductible_expenses: None,
            annual_multiplier: Decimal::ONE,
        };

        let result = breakdown(EntityType::SoleProprietorship, &config, &amounts);

        assert_eq!(result.pension, Some(dec!(18000)));
        assert_eq!(result.health, Some(dec!(7200)));
        assert_eq!(result.income_tax, None);
        assert_eq!(result.total(), None);
    }

    #[test]
    fn revenue_based_ignores_expenses() {
        let config = TaxYearConfig::builtin_2023();

        let without = breakdown(
            EntityType::LlcRevenueBased,
            &config,
            &yearly(dec!(250000), Decimal::ZERO),
        );
        let with = breakdown(
            EntityType::LlcRevenueBased,
            &config,
            &yearly(dec!(250000), dec!(90000)),
        );

        assert_eq!(without.total(), Some(dec!(7500)));
        assert_eq!(with, without);
    }

    #[test]
    fn revenue_based_does_not_need_expense_rate() {
        let config = TaxYearConfig::builtin_2023();
        let amounts = NormalizedAmounts {
            gross_income: Some(dec!(1000)),
            deductible_expenses: None,
            annual_multiplier: Decimal::ONE,
        };

        let result = breakdown(EntityType::LlcRevenueBased, &config, &amounts);

        assert_eq!(result.total(), Some(dec!(30)));
    }

    #[test]
    fn profit_based_taxes_profit() {
        let config = TaxYearConfig::builtin_2023();

        let result = breakdown(
            EntityType::LlcProfitBased,
            &config,
            &yearly(dec!(100000), dec!(40000)),
        );

        assert_eq!(result.income_tax, Some(dec!(9600)));
        assert_eq!(result.retained_expenses, Some(dec!(40000)));
    }

    #[test]
    fn profit_based_never_negative() {
        let config = TaxYearConfig::builtin_2023();

        let result = breakdown(
            EntityType::LlcProfitBased,
            &config,
            &yearly(dec!(20000), dec!(25000)),
        );

        assert_eq!(result.total(), Some(Decimal::ZERO));
    }

    #[test]
    fn expenses_cap_limits_deduction() {
        let config = TaxYearConfig {
            deductible_expenses_cap: Some(dec!(0.30)),
            ..TaxYearConfig::builtin_2023()
        };

        let result = breakdown(
            EntityType::LlcProfitBased,
            &config,
            &yearly(dec!(100000), dec!(50000)),
        );

        // Only 30,000 of the 50,000 is deductible
        assert_eq!(result.income_tax, Some(dec!(11200)));
        // Net income still reflects the full amount spent
        assert_eq!(result.retained_expenses, Some(dec!(50000)));
    }

    #[test]
    fn expenses_cap_limits_sole_proprietorship_deduction() {
        let config = TaxYearConfig {
            deductible_expenses_cap: Some(dec!(0.30)),
            ..TaxYearConfig::builtin_2023()
        };

        let result = breakdown(
            EntityType::SoleProprietorship,
            &config,
            &yearly(dec!(100000), dec!(50000)),
        );

        // Contributions are fixed; only 30,000 of the expenses is offset
        assert_eq!(result.pension, Some(dec!(18000)));
        assert_eq!(result.health, Some(dec!(7200)));
        assert_eq!(result.income_tax, Some(dec!(4480)));
        assert_eq!(result.retained_expenses, Some(Decimal::ZERO));
    }

    #[test]
    fn expenses_below_cap_are_fully_deducted() {
        let config = TaxYearConfig {
            deductible_expenses_cap: Some(dec!(0.30)),
            ..TaxYearConfig::builtin_2023()
        };

        let result = breakdown(
            EntityType::SoleProprietorship,
            &config,
            &yearly(dec!(100000), dec!(10000)),
        );

        assert_eq!(result.income_tax, Some(dec!(6480)));
    }

    #[test]
    fn missing_gross_makes_every_component_unknown() {
        let config = TaxYearConfig::builtin_2023();
        let amounts = NormalizedAmounts {
            gross_income: None,
            deductible_expenses: Some(Decimal::ZERO),
            annual_multiplier: Decimal::ONE,
        };

        for entity in EntityType::ALL {
            let result = breakdown(entity, &config, &amounts);
            assert_eq!(result.pension, None, "{entity}");
            assert_eq!(result.health, None, "{entity}");
            assert_eq!(result.income_tax, None, "{entity}");
        }
    }
}
