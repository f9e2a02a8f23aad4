//! Common utility functions for tax calculations.
//!
//! Shared arithmetic used by the entity-type formulas and by anything that
//! presents their results: rounding for display, flooring and percentages.

use rust_decimal::Decimal;

/// Rounds to two decimal places, midpoints away from zero.
///
/// The engine never calls this; reports round figures when they display them.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(68320.005)), dec!(68320.01));
/// assert_eq!(round_half_up(dec!(-5000.005)), dec!(-5000.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// The larger of `a` and `b`; formulas use it to floor taxable amounts at zero.
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::max;
///
/// assert_eq!(max(dec!(-2500), Decimal::ZERO), Decimal::ZERO);
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Expresses `part` as a percentage of `whole`.
///
/// Returns `None` when either side is unavailable or `whole` is zero, so a
/// degenerate input never turns into a misleading `0` or a division panic.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::percentage;
///
/// assert_eq!(percentage(Some(dec!(25)), Some(dec!(200))), Some(dec!(12.5)));
/// assert_eq!(percentage(Some(dec!(25)), Some(Decimal::ZERO)), None);
/// assert_eq!(percentage(None, Some(dec!(200))), None);
/// ```
pub fn percentage(
    part: Option<Decimal>,
    whole: Option<Decimal>,
) -> Option<Decimal> {
    let part = part?;
    let whole = whole.filter(|w| !w.is_zero())?;
    part.checked_mul(Decimal::ONE_HUNDRED)?.checked_div(whole)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
        assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
    }

    #[test]
    fn round_half_up_handles_negative_net_income() {
        let result = round_half_up(dec!(-5000.005));

        assert_eq!(result, dec!(-5000.01)); // Away from zero
    }

    #[test]
    fn round_half_up_handles_largest_decimal() {
        let result = round_half_up(Decimal::MAX);

        assert_eq!(result, Decimal::MAX);
    }

    // =========================================================================
    // max tests
    // =========================================================================

    #[test]
    fn max_floors_negative_taxable_amount_at_zero() {
        assert_eq!(max(dec!(-7200), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(max(dec!(64800), Decimal::ZERO), dec!(64800));
    }

    // =========================================================================
    // percentage tests
    // =========================================================================

    #[test]
    fn percentage_of_whole() {
        let result = percentage(Some(dec!(31680)), Some(dec!(100000)));

        assert_eq!(result, Some(dec!(31.68)));
    }

    #[test]
    fn percentage_keeps_negative_part() {
        let result = percentage(Some(dec!(-5000)), Some(dec!(20000)));

        assert_eq!(result, Some(dec!(-25)));
    }

    #[test]
    fn percentage_of_zero_whole_is_none() {
        let result = percentage(Some(dec!(100)), Some(Decimal::ZERO));

        assert_eq!(result, None);
    }

    #[test]
    fn percentage_with_missing_inputs_is_none() {
        assert_eq!(percentage(None, Some(dec!(100))), None);
        assert_eq!(percentage(Some(dec!(100)), None), None);
    }

    #[test]
    fn percentage_can_exceed_one_hundred() {
        let result = percentage(Some(dec!(300)), Some(dec!(200)));

        assert_eq!(result, Some(dec!(150)));
    }
}
