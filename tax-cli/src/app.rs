//! Wiring between the command line and the engine: rate providers, rule
//! books, input checks and comparisons.
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tax_core::rates::{ProviderConfig, RateCache, RateProviderRegistry, StaticRateProviderFactory};
use tax_core::{
    CurrencyCode, EntityType, ExchangeRates, InputSnapshot, RuleBook, TaxCalculator, TaxComparison,
    TaxYearConfig,
};
use tax_data::{CsvRateProviderFactory, RulesLoader};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::csv_loader::BatchEntry;

/// How long a fetched rate table stays fresh.
pub const RATES_MAX_AGE_HOURS: i64 = 12;

/// Input the engine would accept but the tax year cannot be applied to.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: Decimal },

    #[error("currency {currency} is not supported for tax year {tax_year}")]
    UnsupportedCurrency {
        currency: CurrencyCode,
        tax_year: i32,
    },
}

/// A snapshot compared across entity types, labelled for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRun {
    pub label: Option<String>,
    pub comparison: TaxComparison,
}

/// Registry with every rate backend this binary knows about.
pub fn build_registry() -> RateProviderRegistry {
    let mut registry = RateProviderRegistry::new();
    registry.register(Box::new(StaticRateProviderFactory));
    registry.register(Box::new(CsvRateProviderFactory));
    registry
}

/// Built-in rule sets, extended or overridden by the TOML file at `rules`.
pub fn build_rule_book(rules: Option<&Path>) -> Result<RuleBook> {
    let mut book = RuleBook::builtin();
    if let Some(path) = rules {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules: {}", path.display()))?;
        let configs = RulesLoader::parse(&contents)
            .with_context(|| format!("Failed to load rules: {}", path.display()))?;
        RulesLoader::load_into(&mut book, configs)?;
    }
    Ok(book)
}

/// The rule set for `tax_year`, or the latest one when no year is given.
pub fn select_year(
    book: &RuleBook,
    tax_year: Option<i32>,
) -> Result<&TaxYearConfig> {
    match tax_year {
        Some(year) => book.get(year).with_context(|| {
            format!("No rules for tax year {year}; available: {:?}", book.years())
        }),
        None => book.latest().context("Rule book is empty"),
    }
}

/// Rate cache for `base_currency` with the standard freshness window.
pub fn new_rate_cache(base_currency: &CurrencyCode) -> RateCache {
    RateCache::new(base_currency.clone(), Duration::hours(RATES_MAX_AGE_HOURS))
}

/// Refreshes `cache` through the configured backend if its table is stale,
/// then applies `overrides` to a copy of the cached table.
///
/// A provider that cannot be built is a configuration error. A provider
/// that fails to fetch leaves the cache as it was (loading on first use), so
/// the report shows which figures are unavailable instead of aborting.
pub async fn fetch_rates(
    registry: &RateProviderRegistry,
    config: &ProviderConfig,
    cache: &mut RateCache,
    overrides: &[(CurrencyCode, Decimal)],
) -> Result<ExchangeRates> {
    let provider = registry
        .create(config)
        .await
        .with_context(|| format!("Cannot set up '{}' exchange rates", config.backend))?;

    if let Err(error) = cache.refresh_if_stale(provider.as_ref(), Utc::now()).await {
        warn!(%error, "continuing without fresh exchange rates");
    }

    let mut rates = cache.current();
    if !overrides.is_empty() {
        if rates.is_loading() {
            rates = ExchangeRates::new(config.base_currency.clone());
        }
        for (currency, rate) in overrides {
            debug!(%currency, %rate, "exchange rate override");
            rates.insert(currency.clone(), *rate);
        }
    }
    Ok(rates)
}

/// Checks a snapshot against the tax year it will be computed with.
pub fn validate_snapshot(
    snapshot: &InputSnapshot,
    config: &TaxYearConfig,
) -> Result<(), InputError> {
    for (field, value) in [
        ("gross income", snapshot.gross_income),
        ("deductible expenses", snapshot.deductible_expenses),
    ] {
        if value < Decimal::ZERO {
            return Err(InputError::Negative { field, value });
        }
    }
    for currency in [
        &snapshot.income_currency,
        &snapshot.deductible_expenses_currency,
    ] {
        if !config.supports(currency) {
            return Err(InputError::UnsupportedCurrency {
                currency: currency.clone(),
                tax_year: config.tax_year,
            });
        }
    }
    Ok(())
}

/// Compares one snapshot across `entity_types`.
pub fn run_single(
    snapshot: &InputSnapshot,
    rates: &ExchangeRates,
    config: &TaxYearConfig,
    entity_types: &[EntityType],
) -> Result<ComparisonRun> {
    validate_snapshot(snapshot, config)?;
    let comparison = TaxCalculator::new(config).compare(snapshot, rates, entity_types);
    info!(
        entity_types = comparison.len(),
        partial = comparison.results.iter().any(|r| r.is_partial()),
        "comparison computed"
    );
    Ok(ComparisonRun {
        label: None,
        comparison,
    })
}

/// Compares every batch entry. Rows naming an entity type are computed for
/// that type only; the rest use `entity_types`.
pub fn run_batch(
    entries: &[BatchEntry],
    rates: &ExchangeRates,
    config: &TaxYearConfig,
    entity_types: &[EntityType],
) -> Result<Vec<ComparisonRun>> {
    let calculator = TaxCalculator::new(config);
    let runs = entries
        .iter()
        .map(|entry| -> Result<ComparisonRun> {
            validate_snapshot(&entry.snapshot, config)
                .with_context(|| format!("Invalid batch row {}", entry.row))?;
            let comparison = match entry.entity_type {
                Some(entity_type) => calculator.compare(&entry.snapshot, rates, &[entity_type]),
                None => calculator.compare(&entry.snapshot, rates, entity_types),
            };
            Ok(ComparisonRun {
                label: Some(format!("row {}", entry.row)),
                comparison,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(rows = runs.len(), "batch computed");
    Ok(runs)
}
