use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code of the currency every threshold and comparison is expressed in.
pub const BASE_CURRENCY: &str = "RON";

/// Error returned when a string is not a three-letter currency code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid currency code '{0}': expected three ASCII letters")]
pub struct CurrencyCodeError(pub String);

/// Three-letter upper-case currency code such as `RON` or `EUR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses a code, trimming whitespace and upper-casing it.
    ///
    /// ```
    /// use tax_core::CurrencyCode;
    ///
    /// assert_eq!(CurrencyCode::parse(" eur ").unwrap().as_str(), "EUR");
    /// assert!(CurrencyCode::parse("EURO").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, CurrencyCodeError> {
        let trimmed = s.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyCodeError(s.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The base currency, `RON`.
    pub fn base() -> Self {
        Self(BASE_CURRENCY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == BASE_CURRENCY
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}
