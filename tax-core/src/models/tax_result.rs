use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CurrencyCode, EntityType, IncomeInterval};

/// Every figure derived from one input snapshot for one entity type.
///
/// Base-currency amounts cover the entered [`IncomeInterval`]. A `None`
/// field means an input it depends on (usually an exchange rate) is not
/// available yet, or that a percentage would divide by zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub entity_type: EntityType,
    pub tax_year: i32,
    pub income_interval: IncomeInterval,

    // Inputs echoed in their own currencies
    pub gross_income: Decimal,
    pub income_currency: CurrencyCode,
    pub deductible_expenses: Decimal,
    pub deductible_expenses_currency: CurrencyCode,

    // Normalized amounts
    pub gross_income_in_base_currency: Option<Decimal>,
    pub annual_gross_income_in_base_currency: Option<Decimal>,
    pub deductible_expenses_in_base_currency: Option<Decimal>,

    // Tax breakdown
    pub pension_tax_amount_in_base_currency: Option<Decimal>,
    pub health_tax_amount_in_base_currency: Option<Decimal>,
    pub income_tax_amount_in_base_currency: Option<Decimal>,
    pub total_tax_amount_in_base_currency: Option<Decimal>,
    pub total_tax_percentage: Option<Decimal>,

    // Net income
    pub net_income: Option<Decimal>,
    pub total_net_income_in_base_currency: Option<Decimal>,
    pub total_net_tax_percentage: Option<Decimal>,

    pub total_deductible_expenses_percentage: Option<Decimal>,
    pub gross_income_over_vat_threshold: bool,
}

impl TaxResult {
    /// Whether any base-currency figure is still waiting on an exchange rate.
    pub fn is_partial(&self) -> bool {
        self.total_tax_amount_in_base_currency.is_none()
            || self.deductible_expenses_in_base_currency.is_none()
    }

    /// Whether the expenses panel has anything to show.
    pub fn has_deductible_expenses(&self) -> bool {
        self.total_deductible_expenses_percentage
            .is_some_and(|pct| pct > Decimal::ZERO)
    }
}

/// Results for several entity types computed from the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComparison {
    pub results: Vec<TaxResult>,
}

impl TaxComparison {
    pub fn get(
        &self,
        entity_type: EntityType,
    ) -> Option<&TaxResult> {
        self.results.iter().find(|r| r.entity_type == entity_type)
    }

    /// The entity type leaving the highest base-currency net income.
    ///
    /// Results whose net income is not available yet are skipped; the first
    /// one wins a tie.
    pub fn best_net_income(&self) -> Option<&TaxResult> {
        self.results
            .iter()
            .filter_map(|r| r.total_net_income_in_base_currency.map(|net| (net, r)))
            .fold(None, |best: Option<(Decimal, &TaxResult)>, (net, r)| match best {
                Some((best_net, _)) if best_net >= net => best,
                _ => Some((net, r)),
            })
            .map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
