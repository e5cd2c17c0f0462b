//! Time-bounded auto-expiring permission grants (Cinderella).
//!
//! At most one grant exists at a time. Each grant arms a timer task
//! that sleeps to the deadline and then re-checks, under the engine
//! lock, that it is still the live grant before reverting anything.
//! Replacing or revoking a grant bumps the epoch, so a stale timer is
//! a guaranteed no-op even if its abort races with the wakeup.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Duration, Instant};
use utoipa::ToSchema;

use crate::error::{EngineError, EngineResult};

use super::state::{EngineState, Grant};
use super::{PolicyEngine, EMERGENCY_MODE};

/// Snapshot of the temporary-permission state for status reporting.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GrantStatus {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<f64>,
    pub base_mode: String,
    pub current_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PolicyEngine {
    /// Grant temporary emergency access for `duration_seconds`.
    ///
    /// Re-entrant: granting while a grant is active replaces it; the
    /// previous timer is disarmed first, so no orphan timers remain.
    /// The base mode is preserved across the escalation.
    pub fn grant_temporary(&self, duration_seconds: u64, reason: &str) -> EngineResult<()> {
        if duration_seconds == 0 {
            return Err(EngineError::InvalidState(
                "grant duration must be positive".to_string(),
            ));
        }
        let mut state = self.lock()?;
        state.grant_epoch += 1;
        let epoch = state.grant_epoch;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        let deadline = Instant::now() + Duration::from_secs(duration_seconds);
        state.grant = Some(Grant {
            expires_at: deadline,
            expires_at_utc: Utc::now() + chrono::Duration::seconds(duration_seconds as i64),
            reason: reason.to_string(),
            epoch,
        });
        state.current_mode = EMERGENCY_MODE.to_string();
        state.timer = Some(self.arm_timer(epoch, deadline));
        tracing::info!(duration_seconds, reason, "temporary emergency access granted");
        Ok(())
    }

    /// Extend the active grant by `additional_seconds` past its current
    /// remaining time. Fails with `InvalidState` when no valid grant
    /// exists.
    pub fn extend_temporary(&self, additional_seconds: u64) -> EngineResult<()> {
        if additional_seconds == 0 {
            return Err(EngineError::InvalidState(
                "extension must be positive".to_string(),
            ));
        }
        let mut state = self.lock()?;
        let now = Instant::now();
        let expires_at = match state.grant.as_ref() {
            Some(grant) if now < grant.expires_at => grant.expires_at,
            _ => {
                return Err(EngineError::InvalidState(
                    "no active temporary permission to extend".to_string(),
                ))
            }
        };
        state.grant_epoch += 1;
        let epoch = state.grant_epoch;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        // remaining + additional, relative to now.
        let deadline = expires_at + Duration::from_secs(additional_seconds);
        if let Some(grant) = state.grant.as_mut() {
            grant.expires_at = deadline;
            grant.expires_at_utc =
                grant.expires_at_utc + chrono::Duration::seconds(additional_seconds as i64);
            grant.epoch = epoch;
        }
        state.timer = Some(self.arm_timer(epoch, deadline));
        tracing::info!(additional_seconds, "temporary emergency access extended");
        Ok(())
    }

    /// Revoke the active grant. Idempotent: revoking with no grant is
    /// a no-op.
    pub fn revoke_temporary(&self) -> EngineResult<()> {
        let mut state = self.lock()?;
        if state.grant.is_some() {
            state.clear_grant();
            tracing::info!(mode = %state.current_mode, "temporary emergency access revoked");
        }
        Ok(())
    }

    /// True iff a grant is active and its deadline has not passed.
    pub fn grant_is_valid(&self) -> bool {
        self.lock()
            .map(|state| state.grant_is_valid(Instant::now()))
            .unwrap_or(false)
    }

    /// Remaining grant time in seconds, clamped at zero. Absent when
    /// no grant exists.
    pub fn remaining_seconds(&self) -> Option<f64> {
        let state = self.lock().ok()?;
        let grant = state.grant.as_ref()?;
        Some(
            grant
                .expires_at
                .saturating_duration_since(Instant::now())
                .as_secs_f64(),
        )
    }

    pub fn grant_status(&self) -> EngineResult<GrantStatus> {
        let state = self.lock()?;
        let now = Instant::now();
        let active = state.grant_is_valid(now);
        Ok(GrantStatus {
            active,
            remaining_seconds: state
                .grant
                .as_ref()
                .map(|grant| grant.expires_at.saturating_duration_since(now).as_secs_f64()),
            base_mode: state.base_mode.clone(),
            current_mode: state.current_mode.clone(),
            reason: state.grant.as_ref().map(|grant| grant.reason.clone()),
            expires_at: state.grant.as_ref().map(|grant| grant.expires_at_utc),
        })
    }

    fn arm_timer(&self, epoch: u64, deadline: Instant) -> tokio::task::JoinHandle<()> {
        let state = self.state_handle();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let Ok(mut state) = state.lock() else {
                return;
            };
            expire_if_current(&mut state, epoch);
        })
    }
}

/// Autonomous expiry: identical effect to a manual revoke, but only
/// when the firing timer still matches the live grant.
fn expire_if_current(state: &mut EngineState, epoch: u64) {
    if state.grant.as_ref().map(|grant| grant.epoch) != Some(epoch) {
        return;
    }
    state.clear_grant();
    tracing::info!(mode = %state.current_mode, "temporary emergency access expired");
}
