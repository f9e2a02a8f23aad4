use std::collections::HashSet;

use serde::Deserialize;
use tax_core::{ConfigError, RuleBook, TaxYearConfig};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading tax-year rule sets.
#[derive(Debug, Error)]
pub enum RulesLoaderError {
    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Tax year {0} is defined more than once")]
    DuplicateYear(i32),

    #[error("Invalid rules for tax year {tax_year}: {source}")]
    InvalidConfig {
        tax_year: i32,
        #[source]
        source: ConfigError,
    },

    #[error("No [[tax_year]] tables found")]
    Empty,
}

impl From<toml::de::Error> for RulesLoaderError {
    fn from(err: toml::de::Error) -> Self {
        RulesLoaderError::TomlParse(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    tax_year: Vec<TaxYearConfig>,
}

/// Loader for tax-year rule sets stored as TOML.
///
/// Each `[[tax_year]]` table describes one year:
///
/// ```toml
/// [[tax_year]]
/// tax_year = 2024
/// base_currency = "RON"
/// currencies = ["RON", "EUR"]
/// reference_wage = "3300"
/// income_tax_rate = "0.10"
/// revenue_tax_rate = "0.03"
/// profit_tax_rate = "0.16"
/// vat_threshold = "300000"
///
/// [tax_year.pension]
/// rate = "0.25"
/// tiers = [{ threshold_wages = 12, base_wages = 12 }]
///
/// [tax_year.health]
/// rate = "0.10"
/// tiers = [{ threshold_wages = 6, base_wages = 6 }]
/// ```
pub struct RulesLoader;

impl RulesLoader {
    /// Parse and validate every rule set in `input`.
    pub fn parse(input: &str) -> Result<Vec<TaxYearConfig>, RulesLoaderError> {
        let file: RulesFile = toml::from_str(input)?;
        if file.tax_year.is_empty() {
            return Err(RulesLoaderError::Empty);
        }

        let mut seen = HashSet::new();
        for config in &file.tax_year {
            if !seen.insert(config.tax_year) {
                return Err(RulesLoaderError::DuplicateYear(config.tax_year));
            }
            config
                .validate()
                .map_err(|source| RulesLoaderError::InvalidConfig {
                    tax_year: config.tax_year,
                    source,
                })?;
            debug!(tax_year = config.tax_year, "parsed tax-year rules");
        }

        Ok(file.tax_year)
    }

    /// Store `configs` in `book`, replacing rule sets for the same years.
    ///
    /// Returns the number of rule sets stored.
    pub fn load_into(
        book: &mut RuleBook,
        configs: Vec<TaxYearConfig>,
    ) -> Result<usize, RulesLoaderError> {
        let count = configs.len();
        for config in configs {
            let tax_year = config.tax_year;
            book.insert(config)
                .map_err(|source| RulesLoaderError::InvalidConfig { tax_year, source })?;
        }
        info!(count, years = ?book.years(), "tax-year rules loaded");
        Ok(count)
    }
}
