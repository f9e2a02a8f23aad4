use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use tax_core::CurrencyCode;
use tax_core::calculations::common::round_half_up;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Error returned for a malformed `CUR=rate` override.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateOverrideError {
    #[error("expected CUR=rate, got '{0}'")]
    Malformed(String),

    #[error("rate for {currency} must be positive, got {rate}")]
    NonPositive { currency: CurrencyCode, rate: Decimal },
}

static RATE_OVERRIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<code>[A-Za-z]{3})\s*=\s*(?P<rate>\d[\d,]*(?:\.\d+)?)$")
        .unwrap_or_else(|e| panic!("rate override pattern is invalid: {e}"))
});

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a string into a [`Decimal`].
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`).
/// Empty or whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::error!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Parses a single `EUR=4.97` override.
///
/// The currency code is case-insensitive and the rate may use comma
/// thousands separators.
pub fn parse_rate_override(s: &str) -> Result<(CurrencyCode, Decimal), RateOverrideError> {
    let trimmed = s.trim();
    let caps = RATE_OVERRIDE
        .captures(trimmed)
        .ok_or_else(|| RateOverrideError::Malformed(trimmed.to_string()))?;

    let currency = CurrencyCode::parse(&caps["code"])
        .map_err(|_| RateOverrideError::Malformed(trimmed.to_string()))?;
    let rate =
        parse_decimal(&caps["rate"]).map_err(|_| RateOverrideError::Malformed(trimmed.to_string()))?;

    if rate <= Decimal::ZERO {
        return Err(RateOverrideError::NonPositive { currency, rate });
    }
    Ok((currency, rate))
}

/// Inserts `,` between every group of three integer digits.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats a decimal rounded to cents with thousands separators.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_cli::utils::format_decimal;
///
/// assert_eq!(format_decimal(dec!(1234567.891)), "1,234,567.89");
/// assert_eq!(format_decimal(dec!(-5000)), "-5,000.00");
/// ```
pub fn format_decimal(value: Decimal) -> String {
    let rounded = round_half_up(value);
    // avoid printing "-0.00"
    let rounded = if rounded.is_zero() {
        format!("{:.2}", Decimal::ZERO)
    } else {
        format!("{rounded:.2}")
    };
    let (sign, unsigned) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));
    format!("{sign}{}.{frac_part}", group_thousands(int_part))
}

/// Formats an amount followed by its currency code, or "—" when unknown.
pub fn format_money(
    amount: Option<Decimal>,
    currency: &CurrencyCode,
) -> String {
    amount
        .map(|v| format!("{} {currency}", format_decimal(v)))
        .unwrap_or_else(|| "—".to_string())
}

/// Formats a percentage with two decimals, or "—" when undefined.
pub fn format_percentage(pct: Option<Decimal>) -> String {
    pct.map(|v| format!("{}%", format_decimal(v)))
        .unwrap_or_else(|| "—".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn ron() -> CurrencyCode {
        CurrencyCode::base()
    }

    #[test]
    fn parse_decimal_accepts_comma_thousands_separator() {
        assert_eq!(parse_decimal("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("1,234,567.89").unwrap(), dec!(1234567.89));
    }

    #[test]
    fn parse_decimal_trim_whitespace() {
        assert_eq!(parse_decimal("  123.45  ").unwrap(), dec!(123.45));
    }

    #[test]
    fn parse_decimal_empty_treated_as_zero() {
        assert_eq!(parse_decimal("").unwrap(), Decimal::ZERO);
        assert_eq!(parse_decimal("   ").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn parse_decimal_invalid_returns_error() {
        assert!(parse_decimal("abc").is_err());
    }

    #[test]
    fn rate_override_parses_code_and_rate() {
        let (code, rate) = parse_rate_override(" eur = 4.9750 ").unwrap();

        assert_eq!(code.as_str(), "EUR");
        assert_eq!(rate, dec!(4.975));
    }

    #[test]
    fn rate_override_rejects_garbage() {
        for input in ["EUR", "EURO=4.9", "EUR=", "=4.9", "EUR=abc", "EUR=-1"] {
            assert!(
                matches!(parse_rate_override(input), Err(RateOverrideError::Malformed(_))),
                "{input} should be malformed"
            );
        }
    }

    #[test]
    fn rate_override_rejects_zero() {
        assert!(matches!(
            parse_rate_override("USD=0"),
            Err(RateOverrideError::NonPositive { .. })
        ));
    }

    #[test]
    fn format_decimal_groups_and_rounds() {
        assert_eq!(format_decimal(dec!(0)), "0.00");
        assert_eq!(format_decimal(dec!(999.995)), "1,000.00");
        assert_eq!(format_decimal(dec!(68320)), "68,320.00");
        assert_eq!(format_decimal(dec!(-0.004)), "0.00");
        assert_eq!(format_decimal(dec!(123456)), "123,456.00");
    }

    #[test]
    fn format_money_uses_dash_when_unknown() {
        assert_eq!(format_money(Some(dec!(31680)), &ron()), "31,680.00 RON");
        assert_eq!(format_money(None, &ron()), "—");
    }

    #[test]
    fn format_percentage_uses_dash_when_undefined() {
        assert_eq!(format_percentage(Some(dec!(31.68))), "31.68%");
        assert_eq!(format_percentage(None), "—");
    }
}
