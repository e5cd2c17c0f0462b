//! Routing from tool names to executor functions.

use serde_json::Value;

use crate::error::ExecutionError;
use crate::infra::CloudInfra;

const DEFAULT_LOG_LINES: usize = 10;

/// Execute `tool` against the infrastructure. Callers must have
/// validated the request first; dispatch performs no policy checks.
pub fn dispatch(tool: &str, args: &Value, infra: &CloudInfra) -> Result<Value, ExecutionError> {
    match tool {
        "list_services" => Ok(infra.list_services()),
        "get_service_status" => {
            let service = args.get("service_name").and_then(Value::as_str);
            Ok(infra.service_status(service))
        }
        "read_logs" => {
            let lines = args
                .get("lines")
                .and_then(Value::as_u64)
                .map(|lines| lines as usize)
                .unwrap_or(DEFAULT_LOG_LINES);
            Ok(infra.read_logs(lines))
        }
        "restart_service" => {
            let service = required_str(tool, args, "service_name")?;
            infra.restart_service(service)
        }
        "scale_fleet" => {
            let count = args.get("count").and_then(Value::as_u64).ok_or_else(|| {
                ExecutionError::InvalidArguments {
                    tool: tool.to_string(),
                    reason: "requires an integer 'count' argument".to_string(),
                }
            })?;
            let count = u32::try_from(count).map_err(|_| ExecutionError::InvalidArguments {
                tool: tool.to_string(),
                reason: "'count' is out of range".to_string(),
            })?;
            infra.scale_fleet(count)
        }
        "delete_database" => {
            let db_name = args
                .get("db_name")
                .and_then(Value::as_str)
                .or_else(|| args.get("service_name").and_then(Value::as_str))
                .unwrap_or("unknown");
            infra.delete_database(db_name)
        }
        other => Err(ExecutionError::UnknownTool(other.to_string())),
    }
}

fn required_str<'a>(
    tool: &str,
    args: &'a Value,
    key: &str,
) -> Result<&'a str, ExecutionError> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ExecutionError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("requires a '{key}' argument"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::ServiceHealth;
    use serde_json::json;

    #[test]
    fn list_services_dispatches() {
        let infra = CloudInfra::new();
        let result = dispatch("list_services", &json!({}), &infra).expect("dispatch");
        assert_eq!(result["count"], 5);
    }

    #[test]
    fn restart_requires_service_name() {
        let infra = CloudInfra::new();
        let error = dispatch("restart_service", &json!({}), &infra).unwrap_err();
        assert!(matches!(error, ExecutionError::InvalidArguments { .. }));
    }

    #[test]
    fn restart_heals_service() {
        let infra = CloudInfra::new();
        infra.set_health("cache", ServiceHealth::Degraded);
        let result = dispatch(
            "restart_service",
            &json!({"service_name": "cache"}),
            &infra,
        )
        .expect("dispatch");
        assert_eq!(result["new_health"], "healthy");
    }

    #[test]
    fn scale_fleet_requires_count() {
        let infra = CloudInfra::new();
        let error = dispatch(
            "scale_fleet",
            &json!({"service_name": "web-server"}),
            &infra,
        )
        .unwrap_err();
        assert!(matches!(error, ExecutionError::InvalidArguments { .. }));
    }

    #[test]
    fn scale_fleet_applies_count() {
        let infra = CloudInfra::new();
        dispatch(
            "scale_fleet",
            &json!({"service_name": "web-server", "count": 7}),
            &infra,
        )
        .expect("dispatch");
        assert_eq!(infra.snapshot().fleet_size, 7);
    }

    #[test]
    fn delete_database_never_succeeds() {
        let infra = CloudInfra::new();
        let error = dispatch(
            "delete_database",
            &json!({"db_name": "prod"}),
            &infra,
        )
        .unwrap_err();
        assert!(matches!(error, ExecutionError::Rejected(_)));
    }

    #[test]
    fn unknown_tool_is_an_error() {
        let infra = CloudInfra::new();
        let error = dispatch("mystery_tool", &json!({}), &infra).unwrap_err();
        assert!(matches!(error, ExecutionError::UnknownTool(_)));
    }

    #[test]
    fn read_logs_defaults_lines() {
        let infra = CloudInfra::new();
        let result = dispatch("read_logs", &json!({}), &infra).expect("dispatch");
        assert!(result["log_lines"].as_array().unwrap().len() <= DEFAULT_LOG_LINES);
    }
}
