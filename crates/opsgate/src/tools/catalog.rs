//! Descriptions of the invokable tools.

use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

/// Broad classification used by callers to present tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCategory {
    ReadOnly,
    Active,
    Destructive,
}

/// One catalog entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
    #[schema(value_type = Object)]
    pub parameters: serde_json::Value,
}

fn spec(
    name: &str,
    description: &str,
    category: ToolCategory,
    parameters: serde_json::Value,
) -> ToolSpec {
    ToolSpec {
        name: name.to_string(),
        description: description.to_string(),
        category,
        parameters,
    }
}

/// The full tool catalog, in presentation order.
pub fn catalog() -> Vec<ToolSpec> {
    vec![
        spec(
            "list_services",
            "List all available cloud services",
            ToolCategory::ReadOnly,
            json!({}),
        ),
        spec(
            "get_service_status",
            "Get the current health status of cloud services",
            ToolCategory::ReadOnly,
            json!({
                "service_name": {"type": "string", "required": false},
            }),
        ),
        spec(
            "read_logs",
            "Read recent system logs",
            ToolCategory::ReadOnly,
            json!({
                "lines": {"type": "integer", "default": 10},
            }),
        ),
        spec(
            "restart_service",
            "Restart a cloud service (EMERGENCY mode only)",
            ToolCategory::Active,
            json!({
                "service_name": {"type": "string", "required": true},
            }),
        ),
        spec(
            "scale_fleet",
            "Scale the number of service instances (EMERGENCY mode only)",
            ToolCategory::Active,
            json!({
                "service_name": {"type": "string", "required": true},
                "count": {"type": "integer", "required": true},
            }),
        ),
        spec(
            "delete_database",
            "Delete a database (always blocked)",
            ToolCategory::Destructive,
            json!({
                "service_name": {"type": "string", "required": true},
                "db_name": {"type": "string", "required": false},
            }),
        ),
    ]
}
