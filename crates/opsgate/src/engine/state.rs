//! Shared mutable engine state, guarded by one coarse lock.
//!
//! Every validation touches several of these fields together and must
//! observe a consistent snapshot, so mode, grant, health set, incident
//! scope and audit log all live behind the same mutex.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use utoipa::ToSchema;

use crate::audit::AuditLog;

/// The scope of the current incident. While set, scope-restricted
/// mutations may only target its services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IncidentScope {
    #[schema(value_type = Vec<String>)]
    pub affected_services: BTreeSet<String>,
    pub incident_type: String,
    pub reason: String,
    pub set_at: DateTime<Utc>,
}

/// An active temporary permission (Cinderella).
///
/// `epoch` ties the grant to the timer task armed for it: a timer whose
/// epoch no longer matches the live grant must do nothing.
#[derive(Debug)]
pub(crate) struct Grant {
    pub expires_at: Instant,
    pub expires_at_utc: DateTime<Utc>,
    pub reason: String,
    pub epoch: u64,
}

#[derive(Debug)]
pub(crate) struct EngineState {
    pub current_mode: String,
    pub base_mode: String,
    pub grant: Option<Grant>,
    pub grant_epoch: u64,
    pub timer: Option<JoinHandle<()>>,
    pub unhealthy: BTreeSet<String>,
    pub incident_scope: Option<IncidentScope>,
    pub audit: AuditLog,
}

impl EngineState {
    pub fn new(initial_mode: &str, audit_capacity: usize) -> Self {
        Self {
            current_mode: initial_mode.to_string(),
            base_mode: initial_mode.to_string(),
            grant: None,
            grant_epoch: 0,
            timer: None,
            unhealthy: BTreeSet::new(),
            incident_scope: None,
            audit: AuditLog::new(audit_capacity),
        }
    }

    /// True iff a grant exists and its deadline has not passed.
    /// `now >= expires_at` is expired, even before the timer has fired.
    pub fn grant_is_valid(&self, now: Instant) -> bool {
        self.grant.as_ref().is_some_and(|grant| now < grant.expires_at)
    }

    /// Revert to the base mode and drop grant, timer and incident
    /// scope. Shared by manual revocation and autonomous expiry.
    pub fn clear_grant(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.grant = None;
        self.current_mode = self.base_mode.clone();
        self.incident_scope = None;
    }
}
