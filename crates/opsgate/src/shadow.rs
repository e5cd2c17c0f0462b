//! Pre-execution impact simulation.
//!
//! A pure function over (tool, arguments, infrastructure snapshot);
//! never touches engine state and never affects validation decisions.

pub mod report;
pub mod simulate;

pub use report::{ImpactReport, RiskLevel};
pub use simulate::simulate;
