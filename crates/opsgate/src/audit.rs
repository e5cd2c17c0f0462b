//! Bounded, append-only record of validation decisions.
//!
//! The log is cosmetic to the security decision itself: appends are
//! infallible in-memory pushes and can never abort a validation.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::policy::ViolationKind;

/// Default number of records retained before FIFO eviction.
pub const DEFAULT_AUDIT_CAPACITY: usize = 200;

/// The outcome of a single validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionOutcome {
    Allowed,
    BlockedGlobal,
    BlockedMode,
    NotWhitelisted,
    MissingTarget,
    ServiceHealthy,
    OutOfScope,
}

impl From<ViolationKind> for DecisionOutcome {
    fn from(kind: ViolationKind) -> Self {
        match kind {
            ViolationKind::BlockedGlobal => DecisionOutcome::BlockedGlobal,
            ViolationKind::BlockedMode => DecisionOutcome::BlockedMode,
            ViolationKind::NotWhitelisted => DecisionOutcome::NotWhitelisted,
            ViolationKind::MissingTarget => DecisionOutcome::MissingTarget,
            ViolationKind::ServiceHealthy => DecisionOutcome::ServiceHealthy,
            ViolationKind::OutOfScope => DecisionOutcome::OutOfScope,
        }
    }
}

/// One validation attempt, allowed or not, simulation-flagged or not.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationRecord {
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    #[schema(value_type = Object)]
    pub arguments: serde_json::Value,
    pub mode: String,
    pub shadow: bool,
    pub outcome: DecisionOutcome,
}

/// Bounded FIFO log of validation records.
///
/// When full, the oldest record is dropped silently; eviction is never
/// surfaced as an error.
#[derive(Debug)]
pub struct AuditLog {
    capacity: usize,
    records: VecDeque<ValidationRecord>,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: VecDeque::new(),
        }
    }

    pub fn append(&mut self, record: ValidationRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// The most recent `limit` records, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ValidationRecord> {
        let skip = self.records.len().saturating_sub(limit);
        self.records.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(tool: &str, outcome: DecisionOutcome) -> ValidationRecord {
        ValidationRecord {
            timestamp: Utc::now(),
            tool: tool.to_string(),
            arguments: json!({}),
            mode: "NORMAL".to_string(),
            shadow: false,
            outcome,
        }
    }

    #[test]
    fn new_log_is_empty() {
        let log = AuditLog::new(10);
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn append_and_read_back() {
        let mut log = AuditLog::new(10);
        log.append(record("read_logs", DecisionOutcome::Allowed));
        log.append(record("restart_service", DecisionOutcome::BlockedMode));

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].tool, "read_logs");
        assert_eq!(recent[1].outcome, DecisionOutcome::BlockedMode);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut log = AuditLog::new(3);
        for i in 0..5 {
            log.append(record(&format!("tool-{i}"), DecisionOutcome::Allowed));
        }
        assert_eq!(log.len(), 3);
        let recent = log.recent(10);
        assert_eq!(recent[0].tool, "tool-2");
        assert_eq!(recent[2].tool, "tool-4");
    }

    #[test]
    fn recent_limits_to_newest() {
        let mut log = AuditLog::new(10);
        for i in 0..6 {
            log.append(record(&format!("tool-{i}"), DecisionOutcome::Allowed));
        }
        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].tool, "tool-4");
        assert_eq!(recent[1].tool, "tool-5");
    }

    #[test]
    fn zero_capacity_clamps_to_one() {
        let mut log = AuditLog::new(0);
        log.append(record("a", DecisionOutcome::Allowed));
        log.append(record("b", DecisionOutcome::Allowed));
        assert_eq!(log.len(), 1);
        assert_eq!(log.recent(10)[0].tool, "b");
    }

    #[test]
    fn outcome_serializes_screaming_snake() {
        let json = serde_json::to_string(&DecisionOutcome::ServiceHealthy).unwrap();
        assert_eq!(json, "\"SERVICE_HEALTHY\"");
    }
}
