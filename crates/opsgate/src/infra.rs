//! Mock cloud infrastructure: the action executor behind the gate.
//!
//! Stands in for a real cloud control plane. Holds service health
//! states, a fleet size, and a bounded log of executed actions. The
//! engine never talks to this module; the surrounding system executes
//! actions here only after validation passes.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::error::ExecutionError;

const ACTION_LOG_CAPACITY: usize = 100;
const MAX_FLEET_SIZE: u32 = 100;

/// Health state reported by the (mock) health feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealth {
    Healthy,
    Degraded,
    Critical,
}

impl ServiceHealth {
    pub fn is_healthy(self) -> bool {
        matches!(self, ServiceHealth::Healthy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceHealth::Healthy => "healthy",
            ServiceHealth::Degraded => "degraded",
            ServiceHealth::Critical => "critical",
        }
    }
}

/// A consistent point-in-time view of the infrastructure, consumed by
/// the impact simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfraSnapshot {
    pub services: BTreeMap<String, ServiceHealth>,
    pub fleet_size: u32,
}

impl InfraSnapshot {
    pub fn service_health(&self, name: &str) -> Option<ServiceHealth> {
        self.services.get(name).copied()
    }
}

/// One executed (or attempted) infrastructure action.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActionEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
}

struct InfraState {
    services: BTreeMap<String, ServiceHealth>,
    fleet_size: u32,
    log: VecDeque<ActionEntry>,
}

impl InfraState {
    fn log_action(&mut self, action: &str, details: serde_json::Value) {
        if self.log.len() == ACTION_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(ActionEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            details,
        });
    }
}

/// Mock infrastructure with service health tracking.
pub struct CloudInfra {
    state: Mutex<InfraState>,
}

impl CloudInfra {
    pub fn new() -> Self {
        let services = [
            "web-server",
            "api-gateway",
            "database",
            "cache",
            "load-balancer",
        ]
        .into_iter()
        .map(|name| (name.to_string(), ServiceHealth::Healthy))
        .collect();
        Self {
            state: Mutex::new(InfraState {
                services,
                fleet_size: 3,
                log: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InfraState> {
        // A poisoned infra lock only loses mock state; recover the guard.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A consistent snapshot for the impact simulator.
    pub fn snapshot(&self) -> InfraSnapshot {
        let state = self.lock();
        InfraSnapshot {
            services: state.services.clone(),
            fleet_size: state.fleet_size,
        }
    }

    /// Set a service's health. Returns false for unknown services.
    pub fn set_health(&self, service: &str, health: ServiceHealth) -> bool {
        let mut state = self.lock();
        let Some(current) = state.services.get(service).copied() else {
            return false;
        };
        state.services.insert(service.to_string(), health);
        state.log_action(
            "health_change",
            json!({
                "service": service,
                "old_status": current.as_str(),
                "new_status": health.as_str(),
            }),
        );
        true
    }

    /// Services currently degraded or critical, sorted by name.
    pub fn unhealthy_services(&self) -> Vec<String> {
        let state = self.lock();
        state
            .services
            .iter()
            .filter(|(_, health)| !health.is_healthy())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn list_services(&self) -> serde_json::Value {
        let mut state = self.lock();
        state.log_action("list_services", json!({}));
        let names: Vec<&String> = state.services.keys().collect();
        json!({
            "services": names,
            "count": names.len(),
        })
    }

    pub fn service_status(&self, service: Option<&str>) -> serde_json::Value {
        let mut state = self.lock();
        state.log_action("get_service_status", json!({ "service": service }));
        match service {
            Some(name) => match state.services.get(name) {
                Some(health) => json!({
                    "service": name,
                    "health": health.as_str(),
                    "is_healthy": health.is_healthy(),
                }),
                None => json!({
                    "status": "error",
                    "message": format!("service '{name}' not found"),
                    "available_services": state.services.keys().collect::<Vec<_>>(),
                }),
            },
            None => {
                let unhealthy: Vec<&String> = state
                    .services
                    .iter()
                    .filter(|(_, health)| !health.is_healthy())
                    .map(|(name, _)| name)
                    .collect();
                json!({
                    "services": state
                        .services
                        .iter()
                        .map(|(name, health)| (name.clone(), health.as_str()))
                        .collect::<BTreeMap<String, &str>>(),
                    "fleet_size": state.fleet_size,
                    "unhealthy_count": unhealthy.len(),
                    "unhealthy_services": unhealthy,
                    "all_healthy": unhealthy.is_empty(),
                })
            }
        }
    }

    pub fn read_logs(&self, lines: usize) -> serde_json::Value {
        let mut state = self.lock();
        state.log_action("read_logs", json!({ "lines": lines }));
        let mut entries: Vec<String> = state
            .services
            .iter()
            .map(|(name, health)| match health {
                ServiceHealth::Healthy => format!("[INFO] {name}: operating normally"),
                ServiceHealth::Degraded => format!("[WARN] {name}: performance degraded"),
                ServiceHealth::Critical => format!("[ERROR] {name}: critical issues detected"),
            })
            .collect();
        entries.push(format!("[INFO] fleet: {} instances active", state.fleet_size));
        entries.push(format!("[INFO] total services: {}", state.services.len()));
        let total = entries.len();
        entries.truncate(lines);
        json!({
            "log_lines": entries,
            "total_available": total,
        })
    }

    pub fn restart_service(&self, service: &str) -> Result<serde_json::Value, ExecutionError> {
        let mut state = self.lock();
        state.log_action("restart_service", json!({ "service": service }));
        let Some(old_health) = state.services.get(service).copied() else {
            return Err(ExecutionError::InvalidArguments {
                tool: "restart_service".to_string(),
                reason: format!("service '{service}' not found"),
            });
        };
        state
            .services
            .insert(service.to_string(), ServiceHealth::Healthy);
        Ok(json!({
            "status": "success",
            "service": service,
            "action": "restart",
            "old_health": old_health.as_str(),
            "new_health": "healthy",
        }))
    }

    pub fn scale_fleet(&self, count: u32) -> Result<serde_json::Value, ExecutionError> {
        let mut state = self.lock();
        state.log_action("scale_fleet", json!({ "target_count": count }));
        if count < 1 {
            return Err(ExecutionError::InvalidArguments {
                tool: "scale_fleet".to_string(),
                reason: "fleet size must be at least 1".to_string(),
            });
        }
        if count > MAX_FLEET_SIZE {
            return Err(ExecutionError::InvalidArguments {
                tool: "scale_fleet".to_string(),
                reason: format!("fleet size cannot exceed {MAX_FLEET_SIZE}"),
            });
        }
        let old_size = state.fleet_size;
        state.fleet_size = count;
        Ok(json!({
            "status": "success",
            "action": "scale",
            "old_size": old_size,
            "new_size": count,
            "change": count as i64 - old_size as i64,
        }))
    }

    /// Always refuses. The validator blocks this globally; reaching the
    /// executor at all means the gate was bypassed.
    pub fn delete_database(&self, db_name: &str) -> Result<serde_json::Value, ExecutionError> {
        let mut state = self.lock();
        state.log_action("delete_database_attempt", json!({ "db_name": db_name }));
        Err(ExecutionError::Rejected(format!(
            "refusing to delete database '{db_name}': destructive operation"
        )))
    }

    /// The most recent `limit` executed actions, oldest first.
    pub fn recent_actions(&self, limit: usize) -> Vec<ActionEntry> {
        let state = self.lock();
        let skip = state.log.len().saturating_sub(limit);
        state.log.iter().skip(skip).cloned().collect()
    }
}

impl Default for CloudInfra {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_five_healthy_services() {
        let infra = CloudInfra::new();
        let snapshot = infra.snapshot();
        assert_eq!(snapshot.services.len(), 5);
        assert!(snapshot.services.values().all(|h| h.is_healthy()));
        assert_eq!(snapshot.fleet_size, 3);
    }

    #[test]
    fn set_health_tracks_unhealthy() {
        let infra = CloudInfra::new();
        assert!(infra.set_health("web-server", ServiceHealth::Critical));
        assert!(infra.set_health("cache", ServiceHealth::Degraded));
        assert_eq!(infra.unhealthy_services(), vec!["cache", "web-server"]);
    }

    #[test]
    fn set_health_unknown_service_is_false() {
        let infra = CloudInfra::new();
        assert!(!infra.set_health("no-such-service", ServiceHealth::Critical));
    }

    #[test]
    fn restart_resets_health() {
        let infra = CloudInfra::new();
        infra.set_health("database", ServiceHealth::Critical);
        let result = infra.restart_service("database").expect("restart");
        assert_eq!(result["old_health"], "critical");
        assert_eq!(result["new_health"], "healthy");
        assert!(infra.unhealthy_services().is_empty());
    }

    #[test]
    fn restart_unknown_service_fails() {
        let infra = CloudInfra::new();
        let error = infra.restart_service("ghost").unwrap_err();
        assert!(matches!(error, ExecutionError::InvalidArguments { .. }));
    }

    #[test]
    fn scale_fleet_bounds() {
        let infra = CloudInfra::new();
        assert!(infra.scale_fleet(0).is_err());
        assert!(infra.scale_fleet(101).is_err());
        let result = infra.scale_fleet(10).expect("scale");
        assert_eq!(result["old_size"], 3);
        assert_eq!(result["new_size"], 10);
        assert_eq!(infra.snapshot().fleet_size, 10);
    }

    #[test]
    fn delete_database_always_refuses() {
        let infra = CloudInfra::new();
        let error = infra.delete_database("prod").unwrap_err();
        assert!(matches!(error, ExecutionError::Rejected(_)));
    }

    #[test]
    fn action_log_is_bounded() {
        let infra = CloudInfra::new();
        for _ in 0..(ACTION_LOG_CAPACITY + 20) {
            infra.list_services();
        }
        assert_eq!(infra.recent_actions(usize::MAX).len(), ACTION_LOG_CAPACITY);
    }

    #[test]
    fn read_logs_respects_line_limit() {
        let infra = CloudInfra::new();
        let result = infra.read_logs(3);
        assert_eq!(result["log_lines"].as_array().unwrap().len(), 3);
    }
}
