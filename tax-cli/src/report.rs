//! Text and JSON rendering of a [`TaxComparison`].
//!
//! Each entity type gets a panel with its tax breakdown, an optional
//! deductible-expenses section and its net income. Amounts are rounded to
//! cents here and nowhere else; JSON output carries the unrounded figures.
//!
//! Panels are tinted by an [`Accent`]:
//!
//! | Accent   | When                                                     |
//! |----------|----------------------------------------------------------|
//! | `blue`   | total tax at most 50 % of gross income, or unknown       |
//! | `orange` | total tax above 50 %                                     |
//! | `red`    | total tax above 100 %                                    |
//!
//! The net income section also turns red when net income is negative or
//! expenses exceed income, and the expenses section when expenses exceed
//! income.
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tax_core::{CurrencyCode, EntityType, ExchangeRates, IncomeInterval, TaxComparison, TaxResult, TaxYearConfig};

use crate::utils::{format_decimal, format_money, format_percentage};

const ORANGE_ABOVE: Decimal = dec!(50);
const RED_ABOVE: Decimal = dec!(100);

/// Colour used to highlight a panel's headline figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Blue,
    Orange,
    Red,
}

impl Accent {
    fn ansi(&self) -> &'static str {
        match self {
            Self::Blue => "\x1b[1;34m",
            Self::Orange => "\x1b[1;38;5;208m",
            Self::Red => "\x1b[1;31m",
        }
    }
}

/// Accent for the tax breakdown, from the share of gross income taken by tax.
pub fn tax_accent(result: &TaxResult) -> Accent {
    match result.total_tax_percentage {
        Some(pct) if pct > RED_ABOVE => Accent::Red,
        Some(pct) if pct > ORANGE_ABOVE => Accent::Orange,
        _ => Accent::Blue,
    }
}

/// Whether expenses exceed income once both are in the base currency.
pub fn expenses_exceed_income(result: &TaxResult) -> bool {
    match (
        result.deductible_expenses_in_base_currency,
        result.gross_income_in_base_currency,
    ) {
        (Some(expenses), Some(gross)) => expenses > gross,
        _ => false,
    }
}

pub fn net_income_accent(result: &TaxResult) -> Accent {
    let negative_net = result
        .total_net_income_in_base_currency
        .is_some_and(|net| net < Decimal::ZERO);
    if negative_net || expenses_exceed_income(result) {
        Accent::Red
    } else {
        tax_accent(result)
    }
}

pub fn expenses_accent(result: &TaxResult) -> Accent {
    if expenses_exceed_income(result) {
        Accent::Red
    } else {
        tax_accent(result)
    }
}

fn interval_suffix(interval: IncomeInterval) -> &'static str {
    match interval {
        IncomeInterval::Monthly => " / month",
        IncomeInterval::Yearly => " / year",
    }
}

// ---------------------------------------------------------------------------
// JSON shape
// ---------------------------------------------------------------------------

/// One result plus the accents a front end should use for it.
#[derive(Debug, Serialize)]
pub struct JsonPanel<'a> {
    #[serde(flatten)]
    pub result: &'a TaxResult,
    pub tax_accent: Accent,
    pub expenses_accent: Accent,
    pub net_income_accent: Accent,
    pub expenses_exceed_income: bool,
}

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
    pub tax_year: i32,
    pub base_currency: &'a CurrencyCode,
    pub vat_threshold: Decimal,
    pub rates_loading: bool,
    pub best_net_income: Option<EntityType>,
    pub panels: Vec<JsonPanel<'a>>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A comparison together with what is needed to present it.
pub struct Report<'a> {
    label: Option<&'a str>,
    comparison: &'a TaxComparison,
    rates: &'a ExchangeRates,
    config: &'a TaxYearConfig,
    color: bool,
}

impl<'a> Report<'a> {
    pub fn new(
        comparison: &'a TaxComparison,
        rates: &'a ExchangeRates,
        config: &'a TaxYearConfig,
    ) -> Self {
        Self {
            label: None,
            comparison,
            rates,
            config,
            color: false,
        }
    }

    /// Heading printed above the panels, e.g. the batch row.
    pub fn with_label(
        mut self,
        label: &'a str,
    ) -> Self {
        self.label = Some(label);
        self
    }

    /// Emit ANSI colours for accents.
    pub fn with_color(
        mut self,
        color: bool,
    ) -> Self {
        self.color = color;
        self
    }

    pub fn json(&self) -> JsonReport<'a> {
        JsonReport {
            label: self.label,
            tax_year: self.config.tax_year,
            base_currency: &self.config.base_currency,
            vat_threshold: self.config.vat_threshold,
            rates_loading: self.rates.is_loading(),
            best_net_income: self.best_entity(),
            panels: self
                .comparison
                .results
                .iter()
                .map(|result| JsonPanel {
                    result,
                    tax_accent: tax_accent(result),
                    expenses_accent: expenses_accent(result),
                    net_income_accent: net_income_accent(result),
                    expenses_exceed_income: expenses_exceed_income(result),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.json())
    }

    /// Best entity type, only meaningful when there is a choice.
    fn best_entity(&self) -> Option<EntityType> {
        if self.comparison.len() < 2 {
            return None;
        }
        self.comparison
            .best_net_income()
            .map(|result| result.entity_type)
    }

    fn paint(
        &self,
        accent: Accent,
        text: &str,
    ) -> String {
        if self.color {
            format!("{}{text}\x1b[0m", accent.ansi())
        } else {
            text.to_string()
        }
    }

    fn write_panel(
        &self,
        f: &mut fmt::Formatter<'_>,
        result: &TaxResult,
        best: bool,
    ) -> fmt::Result {
        let base = &self.config.base_currency;
        let suffix = interval_suffix(result.income_interval);

        write!(
            f,
            "== {} ({} rules, amounts{suffix})",
            result.entity_type.label(),
            result.tax_year
        )?;
        if best {
            write!(f, " [highest net income]")?;
        }
        writeln!(f, " ==")?;

        if result.is_partial() {
            if self.rates.is_loading() {
                writeln!(f, "  exchange rates are still loading")?;
            } else {
                writeln!(f, "  an exchange rate is missing; some figures are unavailable")?;
            }
        }

        // Taxes
        let accent = tax_accent(result);
        writeln!(
            f,
            "  Taxes {:>38}",
            self.paint(accent, &format_percentage(result.total_tax_percentage))
        )?;
        for (name, amount) in [
            ("Pension", result.pension_tax_amount_in_base_currency),
            ("Health", result.health_tax_amount_in_base_currency),
            ("Income tax", result.income_tax_amount_in_base_currency),
        ] {
            writeln!(f, "    {name:<14}{:>24}", format_money(amount, base))?;
        }
        writeln!(
            f,
            "    {:<14}{:>24}",
            "Total",
            self.paint(
                accent,
                &format_money(result.total_tax_amount_in_base_currency, base)
            )
        )?;

        // Deductible expenses
        if result.has_deductible_expenses() {
            let accent = expenses_accent(result);
            writeln!(
                f,
                "  Deductible expenses {:>24}",
                self.paint(
                    accent,
                    &format_percentage(result.total_deductible_expenses_percentage)
                )
            )?;
            writeln!(
                f,
                "    {:<14}{:>24}",
                "Amount",
                self.paint(
                    accent,
                    &format_money(result.deductible_expenses_in_base_currency, base)
                )
            )?;
            if result.deductible_expenses_currency != *base {
                writeln!(
                    f,
                    "    {:<14}{:>24}",
                    "Entered as",
                    format!(
                        "{} {}",
                        format_decimal(result.deductible_expenses),
                        result.deductible_expenses_currency
                    )
                )?;
            }
            if result.income_currency != *base
                && result.income_currency != result.deductible_expenses_currency
            {
                let in_income_currency = result
                    .deductible_expenses_in_base_currency
                    .and_then(|amount| self.rates.from_base(amount, &result.income_currency));
                writeln!(
                    f,
                    "    {:<14}{:>24}",
                    "About",
                    format_money(in_income_currency, &result.income_currency)
                )?;
            }
            if !result.entity_type.deducts_expenses() {
                writeln!(f, "    not deductible for this entity type")?;
            }
            if expenses_exceed_income(result) {
                writeln!(f, "    {}", self.paint(Accent::Red, "expenses exceed income"))?;
            }
        }

        // Net income
        let accent = net_income_accent(result);
        writeln!(
            f,
            "  Net income {:>33}",
            self.paint(accent, &format_percentage(result.total_net_tax_percentage))
        )?;
        writeln!(
            f,
            "    {:<14}{:>24}",
            format!("In {base}"),
            self.paint(
                accent,
                &format_money(result.total_net_income_in_base_currency, base)
            )
        )?;
        if result.income_currency != *base {
            writeln!(
                f,
                "    {:<14}{:>24}",
                format!("In {}", result.income_currency),
                format_money(result.net_income, &result.income_currency)
            )?;
        }

        if result.gross_income_over_vat_threshold {
            writeln!(
                f,
                "  {}",
                self.paint(
                    Accent::Orange,
                    &format!(
                        "annual gross income exceeds the VAT registration threshold of {} {base}",
                        format_decimal(self.config.vat_threshold)
                    )
                )
            )?;
        }
        Ok(())
    }

    fn write_rates(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let base = &self.config.base_currency;
        if self.rates.is_loading() {
            return writeln!(f, "Exchange rates: loading");
        }
        let quoted: Vec<String> = self
            .rates
            .currencies()
            .into_iter()
            .filter_map(|currency| {
                self.rates
                    .rate(currency)
                    .map(|rate| format!("1 {currency} = {rate} {base}"))
            })
            .collect();
        if quoted.is_empty() {
            writeln!(f, "Exchange rates: none")
        } else {
            writeln!(f, "Exchange rates: {}", quoted.join(", "))
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if let Some(label) = self.label {
            writeln!(f, "# {label}")?;
        }
        let best = self.best_entity();
        for result in &self.comparison.results {
            self.write_panel(f, result, best == Some(result.entity_type))?;
            writeln!(f)?;
        }
        self.write_rates(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tax_core::{InputSnapshot, compare, compute};

    fn eur() -> CurrencyCode {
        CurrencyCode::parse("EUR").unwrap()
    }

    fn rates() -> ExchangeRates {
        ExchangeRates::new(CurrencyCode::base()).with_rate(eur(), dec!(5.0))
    }

    fn result_with(
        tax_pct: Option<Decimal>,
        net: Option<Decimal>,
    ) -> TaxResult {
        let config = TaxYearConfig::builtin_2023();
        let input = InputSnapshot::in_base_currency(dec!(1000), Decimal::ZERO, EntityType::LlcRevenueBased);
        TaxResult {
            total_tax_percentage: tax_pct,
            total_net_income_in_base_currency: net,
            ..compute(&input, &rates(), &config)
        }
    }

    // =========================================================================
    // Accents
    // =========================================================================

    #[test]
    fn tax_accent_thresholds() {
        assert_eq!(tax_accent(&result_with(None, None)), Accent::Blue);
        assert_eq!(tax_accent(&result_with(Some(dec!(50)), None)), Accent::Blue);
        assert_eq!(tax_accent(&result_with(Some(dec!(50.01)), None)), Accent::Orange);
        assert_eq!(tax_accent(&result_with(Some(dec!(100)), None)), Accent::Orange);
        assert_eq!(tax_accent(&result_with(Some(dec!(100.01)), None)), Accent::Red);
    }

    #[test]
    fn negative_net_income_turns_net_panel_red() {
        let result = result_with(Some(dec!(10)), Some(dec!(-1)));

        assert_eq!(net_income_accent(&result), Accent::Red);
        assert_eq!(tax_accent(&result), Accent::Blue);
    }

    #[test]
    fn expenses_above_income_turn_expenses_red() {
        let config = TaxYearConfig::builtin_2023();
        let input =
            InputSnapshot::in_base_currency(dec!(20000), dec!(25000), EntityType::LlcProfitBased);

        let result = compute(&input, &rates(), &config);

        assert!(expenses_exceed_income(&result));
        assert_eq!(expenses_accent(&result), Accent::Red);
        assert_eq!(net_income_accent(&result), Accent::Red);
    }

    // =========================================================================
    // Text
    // =========================================================================

    #[test]
    fn text_report_shows_rounded_breakdown() {
        let config = TaxYearConfig::builtin_2023();
        let input = InputSnapshot::in_base_currency(
            dec!(100000),
            dec!(10000),
            EntityType::SoleProprietorship,
        );
        let comparison = compare(&input, &rates(), &config, &[EntityType::SoleProprietorship]);

        let text = Report::new(&comparison, &rates(), &config).to_string();

        assert!(text.contains("Sole proprietorship"));
        assert!(text.contains("18,000.00 RON"));
        assert!(text.contains("7,200.00 RON"));
        assert!(text.contains("6,480.00 RON"));
        assert!(text.contains("31,680.00 RON"));
        assert!(text.contains("68,320.00 RON"));
        assert!(text.contains("Deductible expenses"));
        assert!(!text.contains("highest net income"));
        assert!(!text.contains("not deductible"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn expenses_section_hidden_without_expenses() {
        let config = TaxYearConfig::builtin_2023();
        let input =
            InputSnapshot::in_base_currency(dec!(50000), Decimal::ZERO, EntityType::LlcRevenueBased);
        let comparison = compare(&input, &rates(), &config, &[EntityType::LlcRevenueBased]);

        let text = Report::new(&comparison, &rates(), &config).to_string();

        assert!(!text.contains("Deductible expenses"));
    }

    #[test]
    fn vat_banner_and_foreign_net_income() {
        let config = TaxYearConfig::builtin_2023();
        let input = InputSnapshot {
            income_currency: eur(),
            deductible_expenses_currency: eur(),
            ..InputSnapshot::in_base_currency(dec!(70000), Decimal::ZERO, EntityType::LlcRevenueBased)
        };
        let comparison = compare(&input, &rates(), &config, &[EntityType::LlcRevenueBased]);

        let text = Report::new(&comparison, &rates(), &config).to_string();

        // 70000 EUR * 5 = 350000 RON, over the threshold
        assert!(text.contains("VAT registration threshold of 300,000.00 RON"));
        assert!(text.contains("In EUR"));
        assert!(text.contains("1 EUR = 5.0 RON"));
    }

    #[test]
    fn loading_rates_are_reported() {
        let config = TaxYearConfig::builtin_2023();
        let loading = ExchangeRates::loading(CurrencyCode::base());
        let input = InputSnapshot {
            income_currency: eur(),
            ..InputSnapshot::in_base_currency(dec!(1000), Decimal::ZERO, EntityType::LlcRevenueBased)
        };
        let comparison = compare(&input, &loading, &config, &[EntityType::LlcRevenueBased]);

        let text = Report::new(&comparison, &loading, &config).to_string();

        assert!(text.contains("exchange rates are still loading"));
        assert!(text.contains("Exchange rates: loading"));
        assert!(text.contains('—'));
    }

    #[test]
    fn colored_report_marks_best_entity() {
        let config = TaxYearConfig::builtin_2023();
        let input =
            InputSnapshot::in_base_currency(dec!(100000), dec!(10000), EntityType::SoleProprietorship);
        let comparison = compare(&input, &rates(), &config, &EntityType::ALL);

        let text = Report::new(&comparison, &rates(), &config)
            .with_label("row 1")
            .with_color(true)
            .to_string();

        assert!(text.starts_with("# row 1\n"));
        assert!(text.contains("\x1b[1;34m"));
        assert_eq!(text.matches("[highest net income]").count(), 1);
        assert_eq!(text.matches("not deductible for this entity type").count(), 1);
    }

    // =========================================================================
    // JSON
    // =========================================================================

    #[test]
    fn json_report_flattens_results_with_accents() {
        let config = TaxYearConfig::builtin_2023();
        let input =
            InputSnapshot::in_base_currency(dec!(20000), dec!(25000), EntityType::LlcProfitBased);
        let comparison = compare(&input, &rates(), &config, &EntityType::ALL);

        let json = Report::new(&comparison, &rates(), &config).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tax_year"], 2023);
        assert_eq!(value["rates_loading"], false);
        assert_eq!(value["panels"].as_array().map(Vec::len), Some(3));
        let profit = &value["panels"][2];
        assert_eq!(profit["entity_type"], "llc-profit-based");
        assert_eq!(profit["net_income_accent"], "red");
        assert_eq!(profit["expenses_exceed_income"], true);
        assert!(value.get("label").is_none());
    }
}
