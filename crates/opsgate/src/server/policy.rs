//! Policy status, mode changes, grants and incident scope over HTTP.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::{GrantStatus, IncidentScope};
use crate::server::error::{ApiError, ApiErrorResponse};
use crate::server::ServerState;

#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyStatusResponse {
    pub policy_name: String,
    pub version: String,
    pub current_mode: String,
    pub base_mode: String,
    pub available_modes: Vec<String>,
    pub description: String,
    pub allowed_tools: Vec<String>,
    pub blocked_tools: Vec<String>,
    pub unhealthy_services: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_scope: Option<IncidentScope>,
    pub emergency: GrantStatus,
    pub summary: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetModeRequest {
    pub mode: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetModeResponse {
    pub mode: String,
    pub allowed_tools: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantRequest {
    pub duration_seconds: u64,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtendRequest {
    pub additional_seconds: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScopeRequest {
    pub affected_services: Vec<String>,
    pub incident_type: String,
    #[serde(default)]
    pub reason: String,
}

#[utoipa::path(
    get,
    path = "/policy/status",
    tag = "policy",
    responses(
        (status = 200, body = PolicyStatusResponse),
        (status = 500, body = ApiErrorResponse),
    )
)]
pub(crate) async fn status(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<PolicyStatusResponse>, ApiError> {
    let engine = &state.engine;
    Ok(Json(PolicyStatusResponse {
        policy_name: engine.document().policy_name.clone(),
        version: engine.document().version.clone(),
        current_mode: engine.current_mode()?,
        base_mode: engine.base_mode()?,
        available_modes: engine.document().mode_names(),
        description: engine.mode_description()?,
        allowed_tools: engine.allowed_tools()?,
        blocked_tools: engine.blocked_tools()?,
        unhealthy_services: engine.unhealthy_services()?,
        incident_scope: engine.incident_scope()?,
        emergency: engine.grant_status()?,
        summary: engine.summary()?,
    }))
}

#[utoipa::path(
    post,
    path = "/policy/mode",
    tag = "policy",
    request_body = SetModeRequest,
    responses(
        (status = 200, body = SetModeResponse),
        (status = 400, body = ApiErrorResponse),
    )
)]
pub(crate) async fn set_mode(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<SetModeRequest>,
) -> Result<Json<SetModeResponse>, ApiError> {
    state.engine.set_mode(&payload.mode)?;
    Ok(Json(SetModeResponse {
        mode: payload.mode,
        allowed_tools: state.engine.allowed_tools()?,
    }))
}

#[utoipa::path(
    get,
    path = "/policy/emergency",
    tag = "policy",
    responses((status = 200, body = GrantStatus))
)]
pub(crate) async fn emergency_status(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<GrantStatus>, ApiError> {
    Ok(Json(state.engine.grant_status()?))
}

#[utoipa::path(
    post,
    path = "/policy/emergency/grant",
    tag = "policy",
    request_body = GrantRequest,
    responses(
        (status = 200, body = GrantStatus),
        (status = 409, body = ApiErrorResponse),
    )
)]
pub(crate) async fn grant(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<GrantRequest>,
) -> Result<Json<GrantStatus>, ApiError> {
    state
        .engine
        .grant_temporary(payload.duration_seconds, &payload.reason)?;
    Ok(Json(state.engine.grant_status()?))
}

#[utoipa::path(
    post,
    path = "/policy/emergency/extend",
    tag = "policy",
    request_body = ExtendRequest,
    responses(
        (status = 200, body = GrantStatus),
        (status = 409, body = ApiErrorResponse),
    )
)]
pub(crate) async fn extend(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ExtendRequest>,
) -> Result<Json<GrantStatus>, ApiError> {
    state.engine.extend_temporary(payload.additional_seconds)?;
    Ok(Json(state.engine.grant_status()?))
}

#[utoipa::path(
    post,
    path = "/policy/emergency/revoke",
    tag = "policy",
    responses((status = 200, body = GrantStatus))
)]
pub(crate) async fn revoke(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<GrantStatus>, ApiError> {
    state.engine.revoke_temporary()?;
    Ok(Json(state.engine.grant_status()?))
}

#[utoipa::path(
    post,
    path = "/policy/scope",
    tag = "policy",
    request_body = ScopeRequest,
    responses(
        (status = 200, body = IncidentScope),
        (status = 409, body = ApiErrorResponse),
    )
)]
pub(crate) async fn set_scope(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ScopeRequest>,
) -> Result<Json<IncidentScope>, ApiError> {
    state.engine.set_incident_scope(
        payload.affected_services,
        &payload.incident_type,
        &payload.reason,
    )?;
    state
        .engine
        .incident_scope()?
        .map(Json)
        .ok_or_else(|| ApiError::internal("incident scope missing after set"))
}

#[utoipa::path(
    delete,
    path = "/policy/scope",
    tag = "policy",
    responses((status = 200))
)]
pub(crate) async fn clear_scope(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.engine.clear_incident_scope()?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
