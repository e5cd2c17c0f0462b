//! The orchestrating policy engine: one lock, three protocols.

pub mod grant;
pub mod scope;
pub mod state;
pub mod validate;

pub use grant::GrantStatus;
pub use state::IncidentScope;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::audit::{ValidationRecord, DEFAULT_AUDIT_CAPACITY};
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::policy::PolicyDocument;

use self::state::EngineState;

/// The mode every engine starts in.
pub const DEFAULT_MODE: &str = "NORMAL";
/// The mode a temporary grant escalates to.
pub const EMERGENCY_MODE: &str = "EMERGENCY";

/// Runtime authorization gate. An explicitly constructed, explicitly
/// owned instance; clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    document: Arc<PolicyDocument>,
    state: Arc<Mutex<EngineState>>,
}

impl PolicyEngine {
    /// Build an engine over a loaded policy document.
    ///
    /// The document must define both the default and the emergency
    /// mode; anything else is a startup precondition failure.
    pub fn new(document: PolicyDocument) -> Result<Self, ConfigError> {
        Self::with_audit_capacity(document, DEFAULT_AUDIT_CAPACITY)
    }

    pub fn with_audit_capacity(
        document: PolicyDocument,
        audit_capacity: usize,
    ) -> Result<Self, ConfigError> {
        for required in [DEFAULT_MODE, EMERGENCY_MODE] {
            if document.mode(required).is_none() {
                return Err(ConfigError::MissingMode(required.to_string()));
            }
        }
        Ok(Self {
            document: Arc::new(document),
            state: Arc::new(Mutex::new(EngineState::new(DEFAULT_MODE, audit_capacity))),
        })
    }

    /// Change the operational mode permanently. Revokes any active
    /// temporary grant first so the new base is unambiguous.
    pub fn set_mode(&self, mode: &str) -> EngineResult<()> {
        if self.document.mode(mode).is_none() {
            return Err(EngineError::UnknownMode(mode.to_string()));
        }
        let mut state = self.lock()?;
        if state.grant.is_some() {
            state.clear_grant();
        }
        state.current_mode = mode.to_string();
        state.base_mode = mode.to_string();
        tracing::info!(mode, "operational mode changed");
        Ok(())
    }

    pub fn current_mode(&self) -> EngineResult<String> {
        Ok(self.lock()?.current_mode.clone())
    }

    pub fn base_mode(&self) -> EngineResult<String> {
        Ok(self.lock()?.base_mode.clone())
    }

    /// Tools allowed in the current mode, sorted.
    pub fn allowed_tools(&self) -> EngineResult<Vec<String>> {
        let mode = self.current_mode()?;
        self.mode_tools(&mode, |policy| &policy.allowed_tools)
    }

    /// Tools blocked in the current mode, sorted.
    pub fn blocked_tools(&self) -> EngineResult<Vec<String>> {
        let mode = self.current_mode()?;
        self.mode_tools(&mode, |policy| &policy.blocked_tools)
    }

    pub fn mode_description(&self) -> EngineResult<String> {
        let mode = self.current_mode()?;
        Ok(self
            .document
            .mode(&mode)
            .map(|policy| policy.description.clone())
            .unwrap_or_default())
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }

    /// The most recent `limit` validation records, oldest first.
    pub fn history(&self, limit: usize) -> EngineResult<Vec<ValidationRecord>> {
        Ok(self.lock()?.audit.recent(limit))
    }

    /// Human-readable status block.
    pub fn summary(&self) -> EngineResult<String> {
        let state = self.lock()?;
        let mut lines = vec![
            format!(
                "policy: {} v{}",
                self.document.policy_name, self.document.version
            ),
            format!(
                "mode: {} (base {})",
                state.current_mode, state.base_mode
            ),
        ];
        if let Some(grant) = &state.grant {
            let remaining = grant
                .expires_at
                .saturating_duration_since(tokio::time::Instant::now())
                .as_secs_f64();
            lines.push(format!(
                "temporary access: {remaining:.1}s remaining (reason: {})",
                grant.reason
            ));
        }
        if let Some(scope) = &state.incident_scope {
            let services: Vec<&str> =
                scope.affected_services.iter().map(String::as_str).collect();
            lines.push(format!(
                "incident scope: {} ({})",
                services.join(", "),
                scope.incident_type
            ));
        }
        if !state.unhealthy.is_empty() {
            let services: Vec<&str> = state.unhealthy.iter().map(String::as_str).collect();
            lines.push(format!("unhealthy services: {}", services.join(", ")));
        }
        if let Some(policy) = self.document.mode(&state.current_mode) {
            if !policy.description.is_empty() {
                lines.push(policy.description.clone());
            }
        }
        Ok(lines.join("\n"))
    }

    fn mode_tools(
        &self,
        mode: &str,
        select: impl Fn(&crate::policy::ModePolicy) -> &std::collections::HashSet<String>,
    ) -> EngineResult<Vec<String>> {
        let policy = self
            .document
            .mode(mode)
            .ok_or_else(|| EngineError::Internal(format!("mode '{mode}' missing from document")))?;
        let mut tools: Vec<String> = select(policy).iter().cloned().collect();
        tools.sort();
        Ok(tools)
    }

    pub(crate) fn lock(&self) -> EngineResult<MutexGuard<'_, EngineState>> {
        self.state
            .lock()
            .map_err(|_| EngineError::Internal("engine state lock poisoned".to_string()))
    }

    pub(crate) fn state_handle(&self) -> Arc<Mutex<EngineState>> {
        Arc::clone(&self.state)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    pub(crate) fn test_document() -> PolicyDocument {
        PolicyDocument::from_json(
            r#"{
                "policy_name": "test-policy",
                "version": "1.0",
                "modes": {
                    "NORMAL": {
                        "allowed_tools": ["list_services", "get_service_status", "read_logs"],
                        "blocked_tools": ["restart_service", "scale_fleet", "delete_database"],
                        "description": "routine operations",
                        "service_restrictions": {"enabled": false}
                    },
                    "EMERGENCY": {
                        "allowed_tools": [
                            "list_services", "get_service_status", "read_logs",
                            "restart_service", "scale_fleet"
                        ],
                        "blocked_tools": ["delete_database"],
                        "description": "incident response",
                        "service_restrictions": {"enabled": true}
                    }
                },
                "global_rules": {"always_blocked": ["delete_database"]}
            }"#,
        )
        .expect("test document")
    }

    pub(crate) fn test_engine() -> PolicyEngine {
        PolicyEngine::new(test_document()).expect("test engine")
    }
}
