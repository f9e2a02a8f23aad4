use std::fmt;

use serde::{Deserialize, Serialize};

/// Legal structure whose tax formula applies to an income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    /// Self-employed individual paying fixed pension/health contributions
    /// and a flat income tax on what remains.
    SoleProprietorship,
    /// Company taxed at a flat rate on gross revenue.
    LlcRevenueBased,
    /// Company taxed at a flat rate on revenue minus deductible expenses.
    LlcProfitBased,
}

impl EntityType {
    /// Every entity type, in the order comparison panels are shown.
    pub const ALL: [EntityType; 3] = [
        Self::SoleProprietorship,
        Self::LlcRevenueBased,
        Self::LlcProfitBased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoleProprietorship => "sole-proprietorship",
            Self::LlcRevenueBased => "llc-revenue-based",
            Self::LlcProfitBased => "llc-profit-based",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sole-proprietorship" => Some(Self::SoleProprietorship),
            "llc-revenue-based" => Some(Self::LlcRevenueBased),
            "llc-profit-based" => Some(Self::LlcProfitBased),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SoleProprietorship => "Sole proprietorship",
            Self::LlcRevenueBased => "LLC (revenue tax)",
            Self::LlcProfitBased => "LLC (profit tax)",
        }
    }

    /// Whether deductible expenses lower this entity's tax base.
    pub fn deducts_expenses(&self) -> bool {
        !matches!(self, Self::LlcRevenueBased)
    }
}

impl fmt::Display for EntityType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
