use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::rates::{ProviderConfig, RateProviderFactory};
use tax_core::{CurrencyCode, ExchangeRateProvider, ExchangeRates, RateProviderError};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading an exchange rate table.
#[derive(Debug, Error)]
pub enum RateTableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid currency code '{code}' on row {row}")]
    InvalidCurrency { code: String, row: usize },

    #[error("Rate for {currency} must be positive, got {rate}")]
    NonPositiveRate { currency: CurrencyCode, rate: Decimal },

    #[error("Currency {0} appears more than once")]
    DuplicateCurrency(CurrencyCode),

    #[error("Base currency {currency} must have rate 1, got {rate}")]
    BaseRateNotOne { currency: CurrencyCode, rate: Decimal },

    #[error("Cannot read rate table: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for RateTableLoaderError {
    fn from(err: csv::Error) -> Self {
        RateTableLoaderError::CsvParse(err.to_string())
    }
}

impl From<RateTableLoaderError> for RateProviderError {
    fn from(err: RateTableLoaderError) -> Self {
        match err {
            RateTableLoaderError::Io(e) => RateProviderError::Fetch(e.to_string()),
            other => RateProviderError::Parse(other.to_string()),
        }
    }
}

/// A single record from an exchange rate CSV file.
///
/// - `currency`: three-letter currency code (e.g. `EUR`)
/// - `rate`: base-currency units per one unit of `currency`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RateTableRecord {
    pub currency: String,
    pub rate: Decimal,
}

/// Loader for exchange rate tables stored as CSV.
///
/// ```csv
/// currency,rate
/// EUR,4.9475
/// USD,4.6173
/// ```
pub struct RateTableLoader;

impl RateTableLoader {
    /// Parse rate records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or
    /// a byte slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<RateTableRecord>, RateTableLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: RateTableRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Build a rate table quoted against `base_currency`.
    ///
    /// A row for the base currency itself is accepted only with rate 1 and
    /// is not stored, since the base always converts at 1.
    pub fn build(
        base_currency: CurrencyCode,
        records: &[RateTableRecord],
    ) -> Result<ExchangeRates, RateTableLoaderError> {
        let mut rates = ExchangeRates::new(base_currency.clone());
        let mut seen = HashSet::new();

        for (idx, record) in records.iter().enumerate() {
            let currency = CurrencyCode::parse(&record.currency).map_err(|_| {
                RateTableLoaderError::InvalidCurrency {
                    code: record.currency.clone(),
                    row: idx + 1,
                }
            })?;

            if !seen.insert(currency.clone()) {
                return Err(RateTableLoaderError::DuplicateCurrency(currency));
            }
            if record.rate <= Decimal::ZERO {
                return Err(RateTableLoaderError::NonPositiveRate {
                    currency,
                    rate: record.rate,
                });
            }
            if currency == base_currency {
                if record.rate != Decimal::ONE {
                    return Err(RateTableLoaderError::BaseRateNotOne {
                        currency,
                        rate: record.rate,
                    });
                }
                continue;
            }

            rates.insert(currency, record.rate);
        }

        debug!(currencies = rates.currencies().len(), "built exchange rate table");
        Ok(rates)
    }
}

/// Serves the rate table stored in a CSV file, re-reading it on every fetch.
#[derive(Debug, Clone)]
pub struct CsvRateProvider {
    path: PathBuf,
    base_currency: CurrencyCode,
}

impl CsvRateProvider {
    pub fn new(
        path: impl Into<PathBuf>,
        base_currency: CurrencyCode,
    ) -> Self {
        Self {
            path: path.into(),
            base_currency,
        }
    }
}

#[async_trait]
impl ExchangeRateProvider for CsvRateProvider {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch_rates(&self) -> Result<ExchangeRates, RateProviderError> {
        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|e| RateProviderError::Fetch(format!("{}: {e}", self.path.display())))?;
        let records = RateTableLoader::parse(contents.as_slice())?;
        Ok(RateTableLoader::build(self.base_currency.clone(), &records)?)
    }
}

/// Registers the `csv` backend; `source` is the path of the rate table.
pub struct CsvRateProviderFactory;

#[async_trait]
impl RateProviderFactory for CsvRateProviderFactory {
    fn backend_name(&self) -> &'static str {
        "csv"
    }

    async fn create(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn ExchangeRateProvider>, RateProviderError> {
        if config.source.trim().is_empty() {
            return Err(RateProviderError::Configuration(
                "csv backend needs a file path as source".to_string(),
            ));
        }
        Ok(Box::new(CsvRateProvider::new(
            config.source.trim(),
            config.base_currency.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = r#"currency,rate
EUR,4.9475
USD,4.6173
GBP,5.7412
"#;

    fn record(
        currency: &str,
        rate: Decimal,
    ) -> RateTableRecord {
        RateTableRecord {
            currency: currency.to_string(),
            rate,
        }
    }

    #[test]
    fn test_parse_valid_csv() {
        let records = RateTableLoader::parse(TEST_CSV.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], record("EUR", dec!(4.9475)));
        assert_eq!(records[2], record("GBP", dec!(5.7412)));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let csv = "currency , rate\n eur , 4.97 \n";

        let records = RateTableLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(records, vec![record("eur", dec!(4.97))]);
    }

    #[test]
    fn test_parse_invalid_rate() {
        let csv = "currency,rate\nEUR,not-a-number\n";

        let result = RateTableLoader::parse(csv.as_bytes());

        assert!(matches!(result, Err(RateTableLoaderError::CsvParse(_))));
    }

    #[test]
    fn test_parse_empty_csv() {
        let records = RateTableLoader::parse("currency,rate\n".as_bytes()).unwrap();

        assert!(records.is_empty());
    }

    #[test]
    fn test_build_table() {
        let records = RateTableLoader::parse(TEST_CSV.as_bytes()).unwrap();

        let rates = RateTableLoader::build(CurrencyCode::base(), &records).unwrap();

        assert_eq!(rates.currencies().len(), 3);
        assert_eq!(
            rates.rate(&CurrencyCode::parse("USD").unwrap()),
            Some(dec!(4.6173))
        );
        assert!(!rates.is_loading());
    }

    #[test]
    fn test_build_accepts_base_row_at_one() {
        let records = vec![record("RON", dec!(1)), record("EUR", dec!(4.97))];

        let rates = RateTableLoader::build(CurrencyCode::base(), &records).unwrap();

        assert_eq!(rates.currencies().len(), 1);
    }

    #[test]
    fn test_build_rejects_base_row_not_one() {
        let records = vec![record("RON", dec!(1.1))];

        let result = RateTableLoader::build(CurrencyCode::base(), &records);

        assert!(matches!(
            result,
            Err(RateTableLoaderError::BaseRateNotOne { .. })
        ));
    }

    #[test]
    fn test_build_rejects_invalid_code_with_row() {
        let records = vec![record("EUR", dec!(4.97)), record("EURO", dec!(4.97))];

        let result = RateTableLoader::build(CurrencyCode::base(), &records);

        match result {
            Err(RateTableLoaderError::InvalidCurrency { code, row }) => {
                assert_eq!(code, "EURO");
                assert_eq!(row, 2);
            }
            other => panic!("expected InvalidCurrency, got {other:?}"),
        }
    }

    #[test]
    fn test_build_rejects_duplicates() {
        let records = vec![record("EUR", dec!(4.97)), record("eur", dec!(4.98))];

        let result = RateTableLoader::build(CurrencyCode::base(), &records);

        assert!(matches!(
            result,
            Err(RateTableLoaderError::DuplicateCurrency(ref c)) if c.as_str() == "EUR"
        ));
    }

    #[test]
    fn test_build_rejects_zero_rate() {
        let records = vec![record("USD", Decimal::ZERO)];

        let result = RateTableLoader::build(CurrencyCode::base(), &records);

        assert!(matches!(
            result,
            Err(RateTableLoaderError::NonPositiveRate { .. })
        ));
    }

    #[tokio::test]
    async fn test_factory_requires_source() {
        let config = ProviderConfig {
            backend: "csv".to_string(),
            ..ProviderConfig::default()
        };

        let result = CsvRateProviderFactory.create(&config).await;

        assert!(matches!(result, Err(RateProviderError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_provider_reports_missing_file_as_fetch_error() {
        let provider = CsvRateProvider::new("does/not/exist.csv", CurrencyCode::base());

        let result = provider.fetch_rates().await;

        assert!(matches!(result, Err(RateProviderError::Fetch(_))));
    }
}
