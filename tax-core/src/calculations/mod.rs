//! Tax calculation modules.
//!
//! The engine converts an input snapshot into base-currency figures and
//! applies the formula of the selected entity type. Submodules hold the
//! shared arithmetic, the fixed contribution schedule and the per-entity
//! formulas.

pub mod common;
pub mod contributions;
pub mod engine;
pub mod entity_taxes;

pub use engine::{TaxCalculator, compare, compute};
pub use entity_taxes::{NormalizedAmounts, TaxBreakdown};
