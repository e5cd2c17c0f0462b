pub mod server;

pub mod audit;
pub mod engine;
pub mod error;
pub mod infra;
pub mod policy;
pub mod shadow;
pub mod tools;

pub use crate::engine::PolicyEngine;
pub use crate::error::{ConfigError, EngineError, EngineResult, ExecutionError};
pub use crate::policy::{PolicyDocument, PolicyViolation, ViolationKind};
