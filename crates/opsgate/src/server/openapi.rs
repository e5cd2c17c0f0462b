use utoipa::OpenApi;

use crate::audit::{DecisionOutcome, ValidationRecord};
use crate::engine::{GrantStatus, IncidentScope};
use crate::infra::{ActionEntry, ServiceHealth};
use crate::policy::ViolationKind;
use crate::server::audit::HistoryResponse;
use crate::server::error::{ApiErrorBody, ApiErrorResponse};
use crate::server::infrastructure::{
    IncidentRequest, IncidentResponse, InfrastructureStatusResponse,
};
use crate::server::policy::{
    ExtendRequest, GrantRequest, PolicyStatusResponse, ScopeRequest, SetModeRequest,
    SetModeResponse,
};
use crate::server::tools::{
    CatalogResponse, ExecuteRequest, ExecuteResponse, SimulateRequest, SimulateResponse,
};
use crate::shadow::{ImpactReport, RiskLevel};
use crate::tools::{ToolCategory, ToolSpec};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Opsgate API",
        version = "0.1.0",
        description = "Runtime authorization gate for privileged infrastructure operations"
    ),
    paths(
        crate::server::policy::status,
        crate::server::policy::set_mode,
        crate::server::policy::emergency_status,
        crate::server::policy::grant,
        crate::server::policy::extend,
        crate::server::policy::revoke,
        crate::server::policy::set_scope,
        crate::server::policy::clear_scope,
        crate::server::tools::execute,
        crate::server::tools::simulate,
        crate::server::tools::tool_catalog,
        crate::server::infrastructure::status,
        crate::server::infrastructure::inject_incident,
        crate::server::audit::history,
    ),
    components(schemas(
        // Error
        ApiErrorResponse,
        ApiErrorBody,
        // Policy
        PolicyStatusResponse,
        SetModeRequest,
        SetModeResponse,
        GrantRequest,
        ExtendRequest,
        ScopeRequest,
        GrantStatus,
        IncidentScope,
        ViolationKind,
        // Tools
        ExecuteRequest,
        ExecuteResponse,
        SimulateRequest,
        SimulateResponse,
        CatalogResponse,
        ToolSpec,
        ToolCategory,
        ImpactReport,
        RiskLevel,
        // Infrastructure
        InfrastructureStatusResponse,
        IncidentRequest,
        IncidentResponse,
        ServiceHealth,
        ActionEntry,
        // Audit
        HistoryResponse,
        ValidationRecord,
        DecisionOutcome,
    ))
)]
pub struct ApiDoc;
