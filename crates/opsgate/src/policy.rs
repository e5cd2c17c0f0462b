//! Declarative policy document and the violations it produces.

pub mod document;
pub mod violation;

pub use document::{GlobalRules, ModePolicy, PolicyDocument, ServiceRestrictions};
pub use violation::{PolicyViolation, ViolationKind};
