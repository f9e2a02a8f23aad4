//! Fixed social contributions owed by a sole proprietorship.
//!
//! Pension and health contributions are not proportional to income. Each
//! [`ContributionRule`] lists tiers expressed in multiples of the reference
//! (minimum) wage; the highest tier whose threshold the annual income reaches
//! decides the base, and the contribution is `rate × base × reference wage`.
//!
//! | Annual income (reference wages) | 2023 pension base | 2023 health base |
//! |---------------------------------|-------------------|------------------|
//! | below 6                         | none              | none             |
//! | 6 to under 12                   | none              | 6                |
//! | 12 to under 24                  | 12                | 12               |
//! | 24 and above                    | 24                | 24               |

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{ContributionRule, ContributionTier};

/// Returns the tier applying to `annual_income`, if any.
pub fn applicable_tier(
    rule: &ContributionRule,
    annual_income: Decimal,
    reference_wage: Decimal,
) -> Option<ContributionTier> {
    rule.tiers
        .iter()
        .rev()
        .find(|tier| {
            Decimal::from(tier.threshold_wages)
                .checked_mul(reference_wage)
                .is_some_and(|threshold| annual_income >= threshold)
        })
        .copied()
}

/// Computes the yearly contribution owed under `rule`.
///
/// The result only changes when the income crosses a tier threshold; it is
/// zero below the lowest tier.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::TaxYearConfig;
/// use tax_core::calculations::contributions::annual_contribution;
///
/// let config = TaxYearConfig::builtin_2023();
///
/// // 40,000 RON reaches 12 reference wages (36,000) but not 24 (72,000).
/// let pension = annual_contribution(&config.pension, dec!(40000), config.reference_wage);
/// assert_eq!(pension, dec!(9000));
/// ```
pub fn annual_contribution(
    rule: &ContributionRule,
    annual_income: Decimal,
    reference_wage: Decimal,
) -> Decimal {
    match applicable_tier(rule, annual_income, reference_wage) {
        Some(tier) => {
            let base = Decimal::from(tier.base_wages).saturating_mul(reference_wage);
            debug!(
                annual_income = %annual_income,
                threshold_wages = tier.threshold_wages,
                base = %base,
                rate = %rule.rate,
                "contribution tier applies"
            );
            base.saturating_mul(rule.rate)
        }
        None => Decimal::ZERO,
    }
}
