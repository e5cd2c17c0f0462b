//! Tool execution and shadow simulation over HTTP.
//!
//! A policy violation is a definitive answer, not a transport failure:
//! blocked executions come back as a 200 envelope with
//! `policy_violation: true`, matching how callers consume decisions.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::audit::DecisionOutcome;
use crate::error::EngineError;
use crate::server::error::{ApiError, ApiErrorResponse};
use crate::server::ServerState;
use crate::shadow::ImpactReport;
use crate::tools::{catalog, dispatch, ToolSpec};

fn empty_object() -> Value {
    json!({})
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExecuteRequest {
    pub tool_name: String,
    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub arguments: Value,
    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub context: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub policy_violation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SimulateRequest {
    pub tool_name: String,
    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub arguments: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SimulateResponse {
    pub report: ImpactReport,
    pub decision: DecisionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub tools: Vec<ToolSpec>,
    pub current_mode: String,
    pub allowed_in_current_mode: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/tools/execute",
    tag = "tools",
    request_body = ExecuteRequest,
    responses(
        (status = 200, body = ExecuteResponse),
        (status = 500, body = ApiErrorResponse),
    )
)]
pub(crate) async fn execute(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let validation = state.engine.validate(
        &payload.tool_name,
        &payload.arguments,
        &payload.context,
        false,
    );
    match validation {
        Ok(()) => {}
        Err(EngineError::Violation(violation)) => {
            return Ok(Json(ExecuteResponse {
                success: false,
                result: None,
                error: Some(format!("policy violation: {}", violation.reason)),
                policy_violation: true,
                blocked_reason: Some(violation.to_string()),
            }));
        }
        Err(other) => return Err(other.into()),
    }

    match dispatch(&payload.tool_name, &payload.arguments, &state.infra) {
        Ok(result) => Ok(Json(ExecuteResponse {
            success: true,
            result: Some(result),
            error: None,
            policy_violation: false,
            blocked_reason: None,
        })),
        Err(error) => Ok(Json(ExecuteResponse {
            success: false,
            result: None,
            error: Some(format!("execution error: {error}")),
            policy_violation: false,
            blocked_reason: None,
        })),
    }
}

#[utoipa::path(
    post,
    path = "/tools/simulate",
    tag = "tools",
    request_body = SimulateRequest,
    responses(
        (status = 200, body = SimulateResponse),
        (status = 500, body = ApiErrorResponse),
    )
)]
pub(crate) async fn simulate(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let snapshot = state.infra.snapshot();
    let report = crate::shadow::simulate(&payload.tool_name, &payload.arguments, &snapshot);

    // Shadow-flag the attempt in the audit trail. The report is
    // returned either way; only the decision alongside it differs.
    let (decision, blocked_reason) = match state.engine.validate(
        &payload.tool_name,
        &payload.arguments,
        &empty_object(),
        true,
    ) {
        Ok(()) => (DecisionOutcome::Allowed, None),
        Err(EngineError::Violation(violation)) => {
            (violation.kind.into(), Some(violation.to_string()))
        }
        Err(other) => return Err(other.into()),
    };

    Ok(Json(SimulateResponse {
        report,
        decision,
        blocked_reason,
    }))
}

#[utoipa::path(
    get,
    path = "/tools/catalog",
    tag = "tools",
    responses((status = 200, body = CatalogResponse))
)]
pub(crate) async fn tool_catalog(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<CatalogResponse>, ApiError> {
    Ok(Json(CatalogResponse {
        tools: catalog(),
        current_mode: state.engine.current_mode()?,
        allowed_in_current_mode: state.engine.allowed_tools()?,
    }))
}
