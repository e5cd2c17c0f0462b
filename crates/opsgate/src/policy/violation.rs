//! Typed policy violations returned by the validator.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The specific check a request failed.
///
/// The order of the variants mirrors the order the validator applies
/// the checks in; the first failing check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// The tool is on the global always-blocked list. No mode or grant
    /// can bypass this.
    BlockedGlobal,
    /// The tool is explicitly blocked in the current mode.
    BlockedMode,
    /// The tool is missing from the current mode's allow-list
    /// (default deny).
    NotWhitelisted,
    /// A state-mutating tool was called without a target service.
    MissingTarget,
    /// The target service is not registered unhealthy.
    ServiceHealthy,
    /// The target service is unhealthy but outside the active
    /// incident scope.
    OutOfScope,
}

/// A rejected request, carrying enough context for user-facing messages
/// and the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, ToSchema)]
#[error("'{tool}' rejected in {mode} mode: {reason}")]
pub struct PolicyViolation {
    pub kind: ViolationKind,
    pub tool: String,
    pub mode: String,
    pub reason: String,
}

impl PolicyViolation {
    pub fn new(
        kind: ViolationKind,
        tool: impl Into<String>,
        mode: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            tool: tool.into(),
            mode: mode.into(),
            reason: reason.into(),
        }
    }
}
