//! Audit history over HTTP.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::audit::ValidationRecord;
use crate::server::error::ApiError;
use crate::server::ServerState;

const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryParams {
    /// Maximum number of records to return, newest kept.
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub records: Vec<ValidationRecord>,
    pub count: usize,
}

#[utoipa::path(
    get,
    path = "/audit/history",
    tag = "audit",
    params(HistoryParams),
    responses((status = 200, body = HistoryResponse))
)]
pub(crate) async fn history(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let records = state.engine.history(limit)?;
    Ok(Json(HistoryResponse {
        count: records.len(),
        records,
    }))
}
