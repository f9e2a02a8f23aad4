use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tax_core::{CurrencyCode, RuleBook};
use tax_data::{RateTableLoader, RulesLoader};

/// Validate exchange-rate tables and tax-year rule files before use.
///
/// The rate CSV file should have the following columns:
/// - currency: Three-letter currency code (e.g., EUR)
/// - rate: Units of the base currency per one unit of `currency`
///
/// The rules file is TOML with one `[[tax_year]]` table per year.
#[derive(Parser, Debug)]
#[command(name = "tax-data-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a CSV file with exchange rates
    #[arg(short, long)]
    rates: Option<PathBuf>,

    /// Path to a TOML file with tax-year rules
    #[arg(short = 'u', long)]
    rules: Option<PathBuf>,

    /// Currency the rate table is quoted against
    #[arg(short, long, default_value = "RON")]
    base: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.rates.is_none() && args.rules.is_none() {
        bail!("nothing to check: pass --rates and/or --rules");
    }

    if let Some(path) = &args.rates {
        let base = CurrencyCode::parse(&args.base)
            .with_context(|| format!("Invalid base currency: {}", args.base))?;

        println!("Checking exchange rates in: {}", path.display());

        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = RateTableLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let rates = RateTableLoader::build(base, &records)
            .with_context(|| format!("Invalid rate table: {}", path.display()))?;

        for currency in rates.currencies() {
            if let Some(rate) = rates.rate(currency) {
                println!("  1 {currency} = {rate} {}", rates.base_currency());
            }
        }
        println!("Rate table OK ({} currencies).", rates.currencies().len());
    }

    if let Some(path) = &args.rules {
        println!("Checking tax-year rules in: {}", path.display());

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        let configs = RulesLoader::parse(&contents)
            .with_context(|| format!("Failed to load rules: {}", path.display()))?;

        let mut book = RuleBook::builtin();
        let loaded = RulesLoader::load_into(&mut book, configs)
            .context("Failed to merge rules with built-in years")?;

        println!(
            "Rules OK ({} tax years loaded; available: {:?}).",
            loaded,
            book.years()
        );
    }

    Ok(())
}
