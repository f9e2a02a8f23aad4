use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ConfigError, TaxYearConfig};

/// Tax-year rule sets keyed by year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBook {
    years: BTreeMap<i32, TaxYearConfig>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A rule book holding every rule set shipped with the crate.
    pub fn builtin() -> Self {
        let config = TaxYearConfig::builtin_2023();
        let mut years = BTreeMap::new();
        years.insert(config.tax_year, config);
        Self { years }
    }

    /// Validates and stores `config`, replacing any rule set for the same year.
    pub fn insert(
        &mut self,
        config: TaxYearConfig,
    ) -> Result<(), ConfigError> {
        config.validate()?;
        self.years.insert(config.tax_year, config);
        Ok(())
    }

    pub fn get(
        &self,
        tax_year: i32,
    ) -> Option<&TaxYearConfig> {
        self.years.get(&tax_year)
    }

    /// The rule set for the most recent year.
    pub fn latest(&self) -> Option<&TaxYearConfig> {
        self.years.values().next_back()
    }

    pub fn years(&self) -> Vec<i32> {
        self.years.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
