use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CurrencyCode, EntityType, IncomeInterval};

/// The values a user has entered at one point in time.
///
/// Expenses are expressed for the same [`IncomeInterval`] as the income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub gross_income: Decimal,
    pub income_currency: CurrencyCode,
    pub income_interval: IncomeInterval,
    pub deductible_expenses: Decimal,
    pub deductible_expenses_currency: CurrencyCode,
    pub entity_type: EntityType,
}

impl InputSnapshot {
    /// A yearly snapshot with income and expenses in the base currency.
    pub fn in_base_currency(
        gross_income: Decimal,
        deductible_expenses: Decimal,
        entity_type: EntityType,
    ) -> Self {
        Self {
            gross_income,
            income_currency: CurrencyCode::base(),
            income_interval: IncomeInterval::Yearly,
            deductible_expenses,
            deductible_expenses_currency: CurrencyCode::base(),
            entity_type,
        }
    }

    /// Returns a copy evaluated under a different entity type.
    pub fn with_entity_type(
        &self,
        entity_type: EntityType,
    ) -> Self {
        Self {
            entity_type,
            ..self.clone()
        }
    }
}
