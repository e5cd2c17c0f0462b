//! Infrastructure status and incident injection.
//!
//! Incident injection is the mock health feed: setting a service's
//! health here also updates the engine's unhealthy set, the way a real
//! health checker would.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::infra::{ActionEntry, ServiceHealth};
use crate::server::error::{ApiError, ApiErrorResponse};
use crate::server::ServerState;

const RECENT_ACTIONS_SHOWN: usize = 10;

#[derive(Debug, Serialize, ToSchema)]
pub struct InfrastructureStatusResponse {
    pub services: BTreeMap<String, ServiceHealth>,
    pub fleet_size: u32,
    pub recent_actions: Vec<ActionEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IncidentRequest {
    pub service: String,
    pub status: ServiceHealth,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IncidentResponse {
    pub service: String,
    pub status: ServiceHealth,
    pub unhealthy_services: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/infrastructure/status",
    tag = "infrastructure",
    responses((status = 200, body = InfrastructureStatusResponse))
)]
pub(crate) async fn status(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<InfrastructureStatusResponse>, ApiError> {
    let snapshot = state.infra.snapshot();
    Ok(Json(InfrastructureStatusResponse {
        services: snapshot.services,
        fleet_size: snapshot.fleet_size,
        recent_actions: state.infra.recent_actions(RECENT_ACTIONS_SHOWN),
    }))
}

#[utoipa::path(
    post,
    path = "/infrastructure/incident",
    tag = "infrastructure",
    request_body = IncidentRequest,
    responses(
        (status = 200, body = IncidentResponse),
        (status = 404, body = ApiErrorResponse),
    )
)]
pub(crate) async fn inject_incident(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<IncidentRequest>,
) -> Result<Json<IncidentResponse>, ApiError> {
    if !state.infra.set_health(&payload.service, payload.status) {
        return Err(ApiError::not_found(format!(
            "service '{}' not found",
            payload.service
        )));
    }
    if payload.status.is_healthy() {
        state.engine.mark_healthy(&payload.service)?;
    } else {
        state.engine.register_unhealthy(&payload.service)?;
    }
    Ok(Json(IncidentResponse {
        service: payload.service,
        status: payload.status,
        unhealthy_services: state.engine.unhealthy_services()?,
    }))
}
