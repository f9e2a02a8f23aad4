//! CSV loader for batches of input snapshots.
//!
//! ## CSV Format
//!
//! Column order does **not** matter (headers are matched by name). Header
//! names are case-sensitive.
//!
//! | Column                         | Required | Type    | Notes                                          |
//! |--------------------------------|----------|---------|------------------------------------------------|
//! | `gross_income`                 | yes      | decimal | Non-negative, per `income_interval`            |
//! | `income_currency`              | yes      | string  | Three-letter code, e.g. `EUR`                  |
//! | `income_interval`              | no       | string  | `monthly` or `yearly`; empty means `yearly`    |
//! | `deductible_expenses`          | no       | decimal | Empty means `0`                                |
//! | `deductible_expenses_currency` | no       | string  | Empty means the income currency                |
//! | `entity_type`                  | no       | string  | Empty means every requested entity type        |
//!
//! ### Entity type values
//!
//! | Value                 | Meaning                    |
//! |-----------------------|----------------------------|
//! | `sole-proprietorship` | Sole proprietorship        |
//! | `llc-revenue-based`   | LLC taxed on revenue       |
//! | `llc-profit-based`    | LLC taxed on profit        |
//!
//! ### Example
//!
//! ```csv
//! gross_income,income_currency,income_interval,deductible_expenses,deductible_expenses_currency,entity_type
//! 100000,RON,yearly,10000,RON,
//! 4000,EUR,monthly,250,EUR,llc-profit-based
//! ```
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{CurrencyCode, EntityType, IncomeInterval, InputSnapshot};

// ---------------------------------------------------------------------------
// Serde-compatible row that mirrors the CSV layout exactly
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    gross_income: Decimal,
    income_currency: String,
    income_interval: Option<String>,
    deductible_expenses: Option<Decimal>,
    deductible_expenses_currency: Option<String>,
    entity_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One snapshot read from a batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// 1-based data row number (header = row 0).
    pub row: usize,
    pub snapshot: InputSnapshot,
    /// `None` when the row leaves the entity type to the caller.
    pub entity_type: Option<EntityType>,
}

/// Errors that can occur while loading or converting CSV data.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    /// The underlying CSV deserialisation failed (bad structure, missing
    /// required column, type mismatch, etc.).
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("invalid currency '{value}' in {column} on row {row}")]
    InvalidCurrency {
        column: &'static str,
        value: String,
        row: usize,
    },

    #[error("unrecognised income interval '{value}' on row {row}")]
    InvalidInterval { value: String, row: usize },

    #[error("unrecognised entity type '{value}' on row {row}")]
    InvalidEntityType { value: String, row: usize },

    #[error("{column} must not be negative on row {row}")]
    NegativeAmount { column: &'static str, row: usize },

    #[error("cannot read batch file: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Core loader
// ---------------------------------------------------------------------------

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_currency(
    column: &'static str,
    value: String,
    row: usize,
) -> Result<CurrencyCode, CsvLoadError> {
    CurrencyCode::parse(&value).map_err(|_| CsvLoadError::InvalidCurrency { column, value, row })
}

/// Convert a single CSV row into a [`BatchEntry`].
///
/// row_number is 1-based (for error messages).
fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<BatchEntry, CsvLoadError> {
    if row.gross_income < Decimal::ZERO {
        return Err(CsvLoadError::NegativeAmount {
            column: "gross_income",
            row: row_number,
        });
    }
    let deductible_expenses = row.deductible_expenses.unwrap_or(Decimal::ZERO);
    if deductible_expenses < Decimal::ZERO {
        return Err(CsvLoadError::NegativeAmount {
            column: "deductible_expenses",
            row: row_number,
        });
    }

    let income_currency = parse_currency("income_currency", row.income_currency, row_number)?;
    let deductible_expenses_currency = match non_empty(row.deductible_expenses_currency) {
        Some(value) => parse_currency("deductible_expenses_currency", value, row_number)?,
        None => income_currency.clone(),
    };

    let income_interval = match non_empty(row.income_interval) {
        Some(value) => IncomeInterval::parse(&value).ok_or(CsvLoadError::InvalidInterval {
            value,
            row: row_number,
        })?,
        None => IncomeInterval::default(),
    };

    let entity_type = match non_empty(row.entity_type) {
        Some(value) => Some(EntityType::parse(&value).ok_or(
            CsvLoadError::InvalidEntityType {
                value,
                row: row_number,
            },
        )?),
        None => None,
    };

    Ok(BatchEntry {
        row: row_number,
        snapshot: InputSnapshot {
            gross_income: row.gross_income,
            income_currency,
            income_interval,
            deductible_expenses,
            deductible_expenses_currency,
            entity_type: entity_type.unwrap_or(EntityType::SoleProprietorship),
        },
        entity_type,
    })
}

/// Parse CSV text and return one [`BatchEntry`] per data row, in file order.
///
/// # Errors
///
/// * [CsvLoadError::Parse] – if the CSV is structurally invalid or a
///   required field cannot be deserialised.
/// * Any of the row-level variants, carrying the 1-based row number.
pub fn load_from_str(input: &str) -> Result<Vec<BatchEntry>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All) // tolerate whitespace around values
        .flexible(false) // strict column count
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

/// Read a file from disk and delegate to [load_from_str].
pub fn load_from_file(path: &Path) -> Result<Vec<BatchEntry>, CsvLoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
