//! Structured impact reports.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

/// Ordered severity scale for simulated impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// Predicted impact of one operation.
///
/// Carries no timestamps or other ambient inputs: identical inputs
/// must serialize to identical reports, and `BTreeMap` keeps field
/// order stable.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ImpactReport {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub risk_level: RiskLevel,
    pub reversible: bool,
    pub predicted_outcome: BTreeMap<String, String>,
    pub estimated_impact: BTreeMap<String, f64>,
    pub alternatives: Vec<String>,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ImpactReport {
    /// A low-risk, read-only report skeleton for the given action.
    pub(crate) fn read_only(action: &str, description: &str) -> Self {
        let mut predicted_outcome = BTreeMap::new();
        predicted_outcome.insert("description".to_string(), description.to_string());
        Self {
            action: action.to_string(),
            target: None,
            risk_level: RiskLevel::None,
            reversible: true,
            predicted_outcome,
            estimated_impact: BTreeMap::new(),
            alternatives: Vec::new(),
            recommendation: "safe to proceed: read-only operation".to_string(),
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::None < RiskLevel::Low);
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn risk_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"critical\"");
        assert_eq!(serde_json::to_string(&RiskLevel::None).unwrap(), "\"none\"");
    }
}
