use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use tax_core::rates::ProviderConfig;
use tax_core::{CurrencyCode, EntityType, IncomeInterval, InputSnapshot};
use tracing::{debug, info};

use tax_cli::report::Report;
use tax_cli::{app, csv_loader, logging, utils};

// ─── CLI definition ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// Compares net income and taxes for a sole proprietorship, a revenue-taxed
/// LLC and a profit-taxed LLC.
///
/// Amounts may use commas as thousands separators. Exchange rates come from
/// the selected backend and can be overridden with `--rate`.
#[derive(Debug, Parser)]
#[command(name = "tax-compare", version, about)]
struct Cli {
    /// Gross income per interval.
    #[arg(long, default_value = "0", value_parser = parse_amount)]
    income: Decimal,

    /// Currency of the gross income.
    #[arg(long, default_value = "RON", value_parser = parse_currency)]
    currency: CurrencyCode,

    /// Whether amounts are per month or per year.
    #[arg(long, default_value = "yearly", value_parser = parse_interval)]
    interval: IncomeInterval,

    /// Deductible expenses per interval.
    #[arg(long, default_value = "0", value_parser = parse_amount)]
    expenses: Decimal,

    /// Currency of the expenses; defaults to the income currency.
    #[arg(long, value_parser = parse_currency)]
    expenses_currency: Option<CurrencyCode>,

    /// Entity type to compute; repeat for several. Defaults to all three.
    #[arg(long = "entity", value_parser = parse_entity)]
    entities: Vec<EntityType>,

    /// Tax year; defaults to the latest year with rules.
    #[arg(long)]
    year: Option<i32>,

    /// TOML file with extra `[[tax_year]]` rule sets.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Exchange rate backend.
    #[arg(long, default_value = "static")]
    rates_backend: String,

    /// Backend source: `EUR=4.97;USD=4.61` for static, a file path for csv.
    #[arg(long, default_value = "")]
    rates: String,

    /// Override one exchange rate, e.g. `--rate EUR=4.97`. Repeatable.
    #[arg(long = "rate", value_parser = parse_override)]
    rate_overrides: Vec<(CurrencyCode, Decimal)>,

    /// CSV file with one snapshot per row; replaces the single-snapshot flags.
    #[arg(long)]
    batch: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Log filter, e.g. `debug` or `warn,tax_core=debug`. Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_amount(s: &str) -> Result<Decimal, String> {
    utils::parse_decimal(s).map_err(|e| e.to_string())
}

fn parse_currency(s: &str) -> Result<CurrencyCode, String> {
    CurrencyCode::parse(s).map_err(|e| e.to_string())
}

fn parse_interval(s: &str) -> Result<IncomeInterval, String> {
    IncomeInterval::parse(s).ok_or_else(|| format!("expected monthly or yearly, got '{s}'"))
}

fn parse_entity(s: &str) -> Result<EntityType, String> {
    EntityType::parse(s).ok_or_else(|| {
        let known: Vec<_> = EntityType::ALL.iter().map(EntityType::as_str).collect();
        format!("unknown entity type '{s}'; expected one of {known:?}")
    })
}

fn parse_override(s: &str) -> Result<(CurrencyCode, Decimal), String> {
    utils::parse_rate_override(s).map_err(|e| e.to_string())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.as_deref())?;
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let book = app::build_rule_book(cli.rules.as_deref())?;
    let config = app::select_year(&book, cli.year)?;
    debug!(tax_year = config.tax_year, "using tax-year rules");

    let entity_types = if cli.entities.is_empty() {
        EntityType::ALL.to_vec()
    } else {
        cli.entities.clone()
    };

    let provider_config = ProviderConfig {
        backend: cli.rates_backend.clone(),
        source: cli.rates.clone(),
        base_currency: config.base_currency.clone(),
    };
    let registry = app::build_registry();
    let mut cache = app::new_rate_cache(&config.base_currency);
    let rates =
        app::fetch_rates(&registry, &provider_config, &mut cache, &cli.rate_overrides).await?;

    let runs = match &cli.batch {
        Some(path) => {
            let entries = csv_loader::load_from_file(path)
                .with_context(|| format!("Failed to load batch: {}", path.display()))?;
            info!(rows = entries.len(), path = %path.display(), "batch loaded");
            app::run_batch(&entries, &rates, config, &entity_types)?
        }
        None => {
            let snapshot = InputSnapshot {
                gross_income: cli.income,
                income_currency: cli.currency.clone(),
                income_interval: cli.interval,
                deductible_expenses: cli.expenses,
                deductible_expenses_currency: cli
                    .expenses_currency
                    .clone()
                    .unwrap_or_else(|| cli.currency.clone()),
                entity_type: entity_types[0],
            };
            vec![app::run_single(&snapshot, &rates, config, &entity_types)?]
        }
    };

    let color = io::stdout().is_terminal();
    let reports: Vec<Report<'_>> = runs
        .iter()
        .map(|run| {
            let report = Report::new(&run.comparison, &rates, config).with_color(color);
            match &run.label {
                Some(label) => report.with_label(label),
                None => report,
            }
        })
        .collect();

    match cli.format {
        OutputFormat::Table => {
            for report in &reports {
                println!("{report}");
            }
        }
        OutputFormat::Json => {
            let json = match reports.as_slice() {
                [single] if cli.batch.is_none() => single.to_json(),
                many => serde_json::to_string_pretty(
                    &many.iter().map(Report::json).collect::<Vec<_>>(),
                ),
            }
            .context("Failed to serialize report")?;
            println!("{json}");
        }
    }

    Ok(())
}
