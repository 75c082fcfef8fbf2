//! Strategy layer: budget guard, comparable filter, cost model, and
//! decision engine.
//!
//! Everything here is pure arithmetic over values the engine hands in.
//! No I/O, no logging; the engine reports what these functions decide.

pub mod budget;
pub mod comps;
pub mod costs;
pub mod decision;

pub use budget::{BudgetEstimate, BudgetGuard};
pub use comps::{CompFilter, CompSet};
pub use costs::{CostBreakdown, CostModel};
pub use decision::DecisionEngine;
