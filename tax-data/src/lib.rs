//! File-backed inputs for the tax engine: exchange-rate tables in CSV and
//! tax-year rule sets in TOML.

pub mod rates_loader;
pub mod rules_loader;

pub use rates_loader::{
    CsvRateProvider, CsvRateProviderFactory, RateTableLoader, RateTableLoaderError,
    RateTableRecord,
};
pub use rules_loader::{RulesLoader, RulesLoaderError};
