use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Period an entered income figure covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeInterval {
    Monthly,
    #[default]
    Yearly,
}

impl IncomeInterval {
    pub const ALL: [IncomeInterval; 2] = [Self::Monthly, Self::Yearly];

    /// Factor that turns a figure for this interval into a yearly one.
    pub fn multiplier(&self) -> Decimal {
        match self {
            Self::Monthly => Decimal::from(12),
            Self::Yearly => Decimal::ONE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for IncomeInterval {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
