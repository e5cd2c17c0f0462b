//! Scope-locked escalation state (Scalpel).
//!
//! Tracks which services are unhealthy and, optionally, an incident
//! scope restricting which of those may be mutated. The health feed
//! mutates the unhealthy set; the validator only reads it.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::error::{EngineError, EngineResult};

use super::state::{EngineState, IncidentScope};

/// Why a scope-restricted mutation was denied.
pub(crate) enum ScopeDenial {
    /// The target is not registered unhealthy.
    ServiceHealthy,
    /// The target is unhealthy but excluded by the incident scope.
    OutOfScope,
}

impl EngineState {
    /// Scope check for one target service, assuming restrictions apply.
    pub(crate) fn scope_denial(&self, service: &str) -> Option<ScopeDenial> {
        if !self.unhealthy.contains(service) {
            return Some(ScopeDenial::ServiceHealthy);
        }
        match &self.incident_scope {
            Some(scope) if !scope.affected_services.contains(service) => {
                Some(ScopeDenial::OutOfScope)
            }
            _ => None,
        }
    }

    /// Whether `service` may be mutated under the given restriction
    /// flag: always when disabled, otherwise only when unhealthy and
    /// inside any active incident scope.
    pub(crate) fn can_modify(&self, service: &str, restriction_enabled: bool) -> bool {
        !restriction_enabled || self.scope_denial(service).is_none()
    }
}

impl super::PolicyEngine {
    /// Lock the current incident to a set of services. Replaces any
    /// existing scope. Declaring a service in scope also registers it
    /// unhealthy: an incident implies its services are not healthy.
    pub fn set_incident_scope(
        &self,
        affected_services: Vec<String>,
        incident_type: &str,
        reason: &str,
    ) -> EngineResult<()> {
        if affected_services.is_empty() {
            return Err(EngineError::InvalidState(
                "incident scope requires at least one service".to_string(),
            ));
        }
        let services: BTreeSet<String> = affected_services.into_iter().collect();
        let mut state = self.lock()?;
        state.unhealthy.extend(services.iter().cloned());
        tracing::info!(
            services = ?services,
            incident_type,
            reason,
            "incident scope locked"
        );
        state.incident_scope = Some(IncidentScope {
            affected_services: services,
            incident_type: incident_type.to_string(),
            reason: reason.to_string(),
            set_at: Utc::now(),
        });
        Ok(())
    }

    /// Drop the incident scope. The unhealthy set is untouched.
    pub fn clear_incident_scope(&self) -> EngineResult<()> {
        let mut state = self.lock()?;
        if state.incident_scope.take().is_some() {
            tracing::info!("incident scope cleared");
        }
        Ok(())
    }

    /// Health feed: mark a service unhealthy. Idempotent.
    pub fn register_unhealthy(&self, service: &str) -> EngineResult<()> {
        let mut state = self.lock()?;
        if state.unhealthy.insert(service.to_string()) {
            tracing::debug!(service, "service registered unhealthy");
        }
        Ok(())
    }

    /// Health feed: mark a service recovered. Idempotent.
    pub fn mark_healthy(&self, service: &str) -> EngineResult<()> {
        let mut state = self.lock()?;
        if state.unhealthy.remove(service) {
            tracing::debug!(service, "service marked healthy");
        }
        Ok(())
    }

    /// Currently unhealthy services, sorted.
    pub fn unhealthy_services(&self) -> EngineResult<Vec<String>> {
        Ok(self.lock()?.unhealthy.iter().cloned().collect())
    }

    pub fn incident_scope(&self) -> EngineResult<Option<IncidentScope>> {
        Ok(self.lock()?.incident_scope.clone())
    }
}
