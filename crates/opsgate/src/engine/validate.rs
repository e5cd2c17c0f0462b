//! The ordered validation pipeline.
//!
//! Checks short-circuit on the first failure; each failure carries a
//! distinct [`ViolationKind`]. Every call, simulation-flagged or not,
//! appends exactly one audit record so history reflects all attempts.

use chrono::Utc;
use serde_json::Value;

use crate::audit::{DecisionOutcome, ValidationRecord};
use crate::error::{EngineError, EngineResult};
use crate::policy::{ModePolicy, PolicyDocument, PolicyViolation, ViolationKind};

use super::scope::ScopeDenial;
use super::state::EngineState;
use super::{PolicyEngine, EMERGENCY_MODE};

/// The closed set of tools the validator treats as state-mutating.
/// Fixed by construction, never inferred from arguments.
pub const MUTATING_TOOLS: [&str; 3] = ["restart_service", "scale_fleet", "delete_database"];

/// Argument naming the target service of a mutating tool.
pub const TARGET_ARGUMENT: &str = "service_name";

pub fn is_mutating(tool: &str) -> bool {
    MUTATING_TOOLS.contains(&tool)
}

impl PolicyEngine {
    /// Validate one operation request against the policy document, the
    /// active grant and the incident scope, in a single lock
    /// acquisition.
    ///
    /// `shadow` marks the attempt as a simulation in the audit trail;
    /// it does not change the decision.
    pub fn validate(
        &self,
        tool: &str,
        args: &Value,
        _context: &Value,
        shadow: bool,
    ) -> EngineResult<()> {
        let mut state = self.lock()?;
        let mode_name = state.current_mode.clone();
        let mode = self.document().mode(&mode_name).ok_or_else(|| {
            EngineError::Internal(format!("current mode '{mode_name}' missing from document"))
        })?;

        let decision = decide(self.document(), &mode_name, mode, &state, tool, args);
        let outcome = match &decision {
            Ok(()) => DecisionOutcome::Allowed,
            Err(violation) => violation.kind.into(),
        };
        state.audit.append(ValidationRecord {
            timestamp: Utc::now(),
            tool: tool.to_string(),
            arguments: args.clone(),
            mode: mode_name,
            shadow,
            outcome,
        });

        match decision {
            Ok(()) => {
                tracing::debug!(tool, shadow, "validation passed");
                Ok(())
            }
            Err(violation) => {
                tracing::info!(tool, shadow, kind = ?violation.kind, "validation rejected");
                Err(EngineError::Violation(violation))
            }
        }
    }
}

fn decide(
    document: &PolicyDocument,
    mode_name: &str,
    mode: &ModePolicy,
    state: &EngineState,
    tool: &str,
    args: &Value,
) -> Result<(), PolicyViolation> {
    // 1. Absolute safety rail: no mode or grant bypasses this.
    if document.global_rules.always_blocked.contains(tool) {
        return Err(PolicyViolation::new(
            ViolationKind::BlockedGlobal,
            tool,
            mode_name,
            "globally blocked destructive operation",
        ));
    }

    // 2. Mode-level block list.
    if mode.blocked_tools.contains(tool) {
        return Err(PolicyViolation::new(
            ViolationKind::BlockedMode,
            tool,
            mode_name,
            format!("blocked in {mode_name} mode"),
        ));
    }

    // 3. Default deny: absence from the allow-list is a rejection.
    if !mode.allowed_tools.contains(tool) {
        return Err(PolicyViolation::new(
            ViolationKind::NotWhitelisted,
            tool,
            mode_name,
            format!("not whitelisted for {mode_name} mode"),
        ));
    }

    // 4. Scope constraints for state-mutating tools.
    if is_mutating(tool) {
        let target = args
            .get(TARGET_ARGUMENT)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty());
        let Some(target) = target else {
            return Err(PolicyViolation::new(
                ViolationKind::MissingTarget,
                tool,
                mode_name,
                format!("requires a '{TARGET_ARGUMENT}' argument"),
            ));
        };

        if mode_name == EMERGENCY_MODE && mode.service_restrictions.enabled {
            match state.scope_denial(target) {
                Some(ScopeDenial::ServiceHealthy) => {
                    let unhealthy: Vec<&str> =
                        state.unhealthy.iter().map(String::as_str).collect();
                    return Err(PolicyViolation::new(
                        ViolationKind::ServiceHealthy,
                        tool,
                        mode_name,
                        format!(
                            "'{target}' is not registered unhealthy; \
                             only unhealthy services may be modified: [{}]",
                            unhealthy.join(", ")
                        ),
                    ));
                }
                Some(ScopeDenial::OutOfScope) => {
                    return Err(PolicyViolation::new(
                        ViolationKind::OutOfScope,
                        tool,
                        mode_name,
                        format!("'{target}' is outside the active incident scope"),
                    ));
                }
                None => {}
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::test_engine;
    use serde_json::json;

    fn violation_kind(result: EngineResult<()>) -> ViolationKind {
        match result.unwrap_err() {
            EngineError::Violation(violation) => violation.kind,
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn read_only_tool_allowed_in_normal() {
        let engine = test_engine();
        engine
            .validate("read_logs", &json!({}), &json!({}), false)
            .expect("allowed");
    }

    #[test]
    fn globally_blocked_wins_in_every_mode() {
        let engine = test_engine();
        let args = json!({"service_name": "prod"});

        assert_eq!(
            violation_kind(engine.validate("delete_database", &args, &json!({}), false)),
            ViolationKind::BlockedGlobal
        );

        engine.set_mode(EMERGENCY_MODE).unwrap();
        engine.register_unhealthy("prod").unwrap();
        assert_eq!(
            violation_kind(engine.validate("delete_database", &args, &json!({}), false)),
            ViolationKind::BlockedGlobal
        );
    }

    #[tokio::test(start_paused = true)]
    async fn globally_blocked_survives_active_grant() {
        let engine = test_engine();
        engine.grant_temporary(60, "incident").unwrap();
        engine.register_unhealthy("prod").unwrap();
        let result = engine.validate(
            "delete_database",
            &json!({"service_name": "prod"}),
            &json!({}),
            false,
        );
        assert_eq!(violation_kind(result), ViolationKind::BlockedGlobal);
    }

    #[test]
    fn mode_blocked_tool_in_normal() {
        let engine = test_engine();
        let result = engine.validate(
            "restart_service",
            &json!({"service_name": "web-server"}),
            &json!({}),
            false,
        );
        assert_eq!(violation_kind(result), ViolationKind::BlockedMode);
    }

    #[test]
    fn unlisted_tool_is_not_whitelisted() {
        let engine = test_engine();
        let result = engine.validate("provision_cluster", &json!({}), &json!({}), false);
        assert_eq!(violation_kind(result), ViolationKind::NotWhitelisted);
    }

    #[test]
    fn mutating_tool_requires_target() {
        let engine = test_engine();
        engine.set_mode(EMERGENCY_MODE).unwrap();
        let result = engine.validate("restart_service", &json!({}), &json!({}), false);
        assert_eq!(violation_kind(result), ViolationKind::MissingTarget);

        let result = engine.validate(
            "restart_service",
            &json!({"service_name": ""}),
            &json!({}),
            false,
        );
        assert_eq!(violation_kind(result), ViolationKind::MissingTarget);
    }

    #[test]
    fn scope_restriction_matrix_in_emergency() {
        let engine = test_engine();
        engine.set_mode(EMERGENCY_MODE).unwrap();
        engine.register_unhealthy("web-server").unwrap();
        engine.register_unhealthy("cache").unwrap();
        engine
            .set_incident_scope(vec!["web-server".to_string()], "outage", "down")
            .unwrap();

        // Healthy target.
        let result = engine.validate(
            "restart_service",
            &json!({"service_name": "database"}),
            &json!({}),
            false,
        );
        assert_eq!(violation_kind(result), ViolationKind::ServiceHealthy);

        // Unhealthy but outside the scope.
        let result = engine.validate(
            "restart_service",
            &json!({"service_name": "cache"}),
            &json!({}),
            false,
        );
        assert_eq!(violation_kind(result), ViolationKind::OutOfScope);

        // Unhealthy and in scope.
        engine
            .validate(
                "restart_service",
                &json!({"service_name": "web-server"}),
                &json!({}),
                false,
            )
            .expect("allowed");
    }

    #[test]
    fn emergency_without_scope_only_needs_unhealthy() {
        let engine = test_engine();
        engine.set_mode(EMERGENCY_MODE).unwrap();
        engine.register_unhealthy("web-server").unwrap();
        engine
            .validate(
                "restart_service",
                &json!({"service_name": "web-server"}),
                &json!({}),
                false,
            )
            .expect("allowed");
    }

    #[test]
    fn every_attempt_is_audited_including_shadow() {
        let engine = test_engine();
        engine
            .validate("read_logs", &json!({}), &json!({}), false)
            .unwrap();
        let _ = engine.validate(
            "restart_service",
            &json!({"service_name": "web-server"}),
            &json!({}),
            true,
        );
        let history = engine.history(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].outcome, DecisionOutcome::Allowed);
        assert!(!history[0].shadow);
        assert_eq!(history[1].outcome, DecisionOutcome::BlockedMode);
        assert!(history[1].shadow);
        assert_eq!(history[1].mode, "NORMAL");
    }

    #[test]
    fn mutating_tool_set_is_closed() {
        assert!(is_mutating("restart_service"));
        assert!(is_mutating("scale_fleet"));
        assert!(is_mutating("delete_database"));
        assert!(!is_mutating("read_logs"));
    }
}
