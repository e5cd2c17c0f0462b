//! Tool catalog and execution dispatch.
//!
//! The catalog describes what can be invoked; dispatch routes an
//! already-validated request to the executor. Neither consults policy:
//! the engine has the only say on whether a tool may run.

pub mod catalog;
pub mod dispatch;

pub use catalog::{catalog, ToolCategory, ToolSpec};
pub use dispatch::dispatch;
