use std::path::PathBuf;

use crate::policy::PolicyViolation;

/// Fatal problems with the policy document, detected at startup.
///
/// These are never retried: a service with a broken policy must not come up.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("policy file not found: {0}")]
    NotFound(PathBuf),

    #[error("policy file is malformed: {0}")]
    Parse(String),

    #[error("mode '{mode}' lists tools as both allowed and blocked: {tools:?}")]
    OverlappingTools { mode: String, tools: Vec<String> },

    #[error("policy document defines no modes")]
    NoModes,

    #[error("policy document does not define required mode '{0}'")]
    MissingMode(String),
}

/// Unified runtime error type for the opsgate engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A request failed one of the ordered policy checks. Expected and
    /// recoverable by the caller; a blocked action is a definitive answer.
    #[error(transparent)]
    Violation(#[from] PolicyViolation),

    /// Caller error, e.g. extending a grant that does not exist.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("unknown mode: {0}")]
    UnknownMode(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors from the action executor behind the gate.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("operation rejected: {0}")]
    Rejected(String),
}
