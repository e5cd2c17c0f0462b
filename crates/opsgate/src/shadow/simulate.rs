//! Table-driven estimation rules, one branch per known tool.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::infra::{InfraSnapshot, ServiceHealth};

use super::report::{ImpactReport, RiskLevel};

const RESTART_DOWNTIME_SECONDS: f64 = 15.0;
const HOURLY_COST_PER_INSTANCE: f64 = 0.10;
const HOURS_PER_MONTH: f64 = 730.0;
const SCALE_MEDIUM_RISK_DELTA: i64 = 5;
const SCALE_CAUTION_DELTA: i64 = 3;

/// Estimated blast radius of a service, used for restart projections.
/// Unknown services fall back to a conservative small footprint.
fn service_weight(service: &str) -> (f64, f64) {
    match service {
        "web-server" => (5000.0, 1000.0),
        "api-gateway" => (3000.0, 800.0),
        "database" => (10000.0, 2000.0),
        "cache" => (2000.0, 300.0),
        "load-balancer" => (8000.0, 1500.0),
        _ => (1000.0, 100.0),
    }
}

/// Predict the impact of executing `tool` with `args` against the
/// given infrastructure snapshot. Pure: no locks, no clocks, no state.
pub fn simulate(tool: &str, args: &Value, snapshot: &InfraSnapshot) -> ImpactReport {
    match tool {
        "restart_service" => simulate_restart(args, snapshot),
        "scale_fleet" => simulate_scale(args, snapshot),
        "delete_database" => simulate_delete(args),
        "get_service_status" => {
            ImpactReport::read_only(tool, "read-only status check, no system changes")
        }
        "read_logs" => ImpactReport::read_only(tool, "read-only log access, no system changes"),
        "list_services" => ImpactReport::read_only(tool, "read-only listing, no system changes"),
        other => {
            let mut report = ImpactReport::read_only(other, "unknown tool, assumed low impact");
            report.risk_level = RiskLevel::Low;
            report
        }
    }
}

fn simulate_restart(args: &Value, snapshot: &InfraSnapshot) -> ImpactReport {
    let service = args
        .get("service_name")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let health = snapshot.service_health(service);
    let currently_healthy = health.map(ServiceHealth::is_healthy).unwrap_or(true);

    let (users, revenue_per_minute) = service_weight(service);
    let revenue_loss = (revenue_per_minute / 60.0) * RESTART_DOWNTIME_SECONDS;

    let mut predicted_outcome = BTreeMap::new();
    predicted_outcome.insert(
        "current_health".to_string(),
        health.map(ServiceHealth::as_str).unwrap_or("unknown").to_string(),
    );
    predicted_outcome.insert(
        "new_health".to_string(),
        if currently_healthy { "unchanged" } else { "healthy" }.to_string(),
    );

    let mut estimated_impact = BTreeMap::new();
    estimated_impact.insert("downtime_seconds".to_string(), RESTART_DOWNTIME_SECONDS);
    estimated_impact.insert("affected_users".to_string(), users);
    estimated_impact.insert(
        "revenue_loss_usd".to_string(),
        (revenue_loss * 100.0).round() / 100.0,
    );
    estimated_impact.insert(
        "success_probability".to_string(),
        if currently_healthy { 0.99 } else { 0.95 },
    );

    ImpactReport {
        action: "restart_service".to_string(),
        target: Some(service.to_string()),
        risk_level: if currently_healthy { RiskLevel::Low } else { RiskLevel::Medium },
        reversible: true,
        predicted_outcome,
        estimated_impact,
        alternatives: if currently_healthy {
            vec![
                "check service logs first".to_string(),
                "scale the fleet to handle load".to_string(),
                "monitor without intervention".to_string(),
            ]
        } else {
            Vec::new()
        },
        recommendation: if currently_healthy {
            "not recommended: service is healthy".to_string()
        } else {
            "proceed: service is unhealthy".to_string()
        },
        warnings: Vec::new(),
    }
}

fn simulate_scale(args: &Value, snapshot: &InfraSnapshot) -> ImpactReport {
    let current = i64::from(snapshot.fleet_size);
    let target = args.get("count").and_then(Value::as_i64).unwrap_or(current);
    let delta = target - current;

    let monthly_cost_delta = delta as f64 * HOURLY_COST_PER_INSTANCE * HOURS_PER_MONTH;
    let capacity_change_percent = if current > 0 {
        (delta as f64 / current as f64) * 100.0
    } else {
        0.0
    };

    let mut predicted_outcome = BTreeMap::new();
    predicted_outcome.insert("new_capacity".to_string(), format!("{target} instances"));
    predicted_outcome.insert(
        "availability".to_string(),
        if delta >= 0 { "improved" } else { "reduced" }.to_string(),
    );
    predicted_outcome.insert(
        "response_time".to_string(),
        if delta >= 0 { "faster" } else { "slower" }.to_string(),
    );

    let mut estimated_impact = BTreeMap::new();
    estimated_impact.insert(
        "monthly_cost_delta_usd".to_string(),
        (monthly_cost_delta * 100.0).round() / 100.0,
    );
    estimated_impact.insert(
        "daily_cost_delta_usd".to_string(),
        (monthly_cost_delta / 30.0 * 100.0).round() / 100.0,
    );
    estimated_impact.insert(
        "capacity_change_percent".to_string(),
        (capacity_change_percent * 10.0).round() / 10.0,
    );

    ImpactReport {
        action: "scale_fleet".to_string(),
        target: None,
        risk_level: if delta.abs() > SCALE_MEDIUM_RISK_DELTA {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        },
        reversible: true,
        predicted_outcome,
        estimated_impact,
        alternatives: vec![
            "monitor current load first".to_string(),
            "scale gradually in steps".to_string(),
            "set an auto-scaling threshold instead".to_string(),
        ],
        recommendation: if delta.abs() > SCALE_CAUTION_DELTA {
            "proceed with caution".to_string()
        } else {
            "safe to proceed".to_string()
        },
        warnings: Vec::new(),
    }
}

fn simulate_delete(args: &Value) -> ImpactReport {
    let db_name = args
        .get("service_name")
        .and_then(Value::as_str)
        .or_else(|| args.get("db_name").and_then(Value::as_str))
        .unwrap_or("unknown");

    let mut predicted_outcome = BTreeMap::new();
    predicted_outcome.insert("data_recovery".to_string(), "impossible".to_string());
    predicted_outcome.insert("service_impact".to_string(), "catastrophic".to_string());
    predicted_outcome.insert(
        "data_loss".to_string(),
        format!("permanent deletion of '{db_name}' and all its data"),
    );

    ImpactReport {
        action: "delete_database".to_string(),
        target: Some(db_name.to_string()),
        risk_level: RiskLevel::Critical,
        reversible: false,
        predicted_outcome,
        estimated_impact: BTreeMap::new(),
        alternatives: vec![
            "archive old data instead of deleting".to_string(),
            "scale up storage capacity".to_string(),
            "create a backup before any operation".to_string(),
            "contact a DBA for safe data cleanup".to_string(),
            "use data retention policies".to_string(),
        ],
        recommendation: "never proceed: use one of the alternatives".to_string(),
        warnings: vec![
            "this action is always blocked by policy".to_string(),
            "permanent data loss".to_string(),
            "violates data retention requirements".to_string(),
        ],
    }
}
