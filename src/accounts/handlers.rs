// HTTP handlers for commission settings

use axum::{
    extract::{Path, State},
    Json,
};

use crate::accounts::{UpdateCommissionRequest, UpdateConsultantLevelRequest};
use crate::error::{ApiError, ErrorResponse};
use crate::models::{Agent, Client};

/// Handler for PUT /api/agents/{agent_id}/commission
#[utoipa::path(
    put,
    path = "/api/agents/{agent_id}/commission",
    params(("agent_id" = String, Path, description = "Agent ID")),
    request_body = UpdateCommissionRequest,
    responses(
        (status = 200, description = "Commission updated", body = Agent),
        (status = 400, description = "Rate outside 0 to 100 or malformed id", body = ErrorResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn update_agent_commission_handler(
    State(state): State<crate::AppState>,
    Path(agent_id): Path<String>,
    Json(request): Json<UpdateCommissionRequest>,
) -> Result<Json<Agent>, ApiError> {
    let agent = state
        .account_service
        .update_commission(&agent_id, request)
        .await?;
    Ok(Json(agent))
}

/// Handler for PUT /api/clients/{client_id}/consultant-level
#[utoipa::path(
    put,
    path = "/api/clients/{client_id}/consultant-level",
    params(("client_id" = String, Path, description = "Client ID")),
    request_body = UpdateConsultantLevelRequest,
    responses(
        (status = 200, description = "Consultant level updated", body = Client),
        (status = 404, description = "Client not found", body = ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn update_consultant_level_handler(
    State(state): State<crate::AppState>,
    Path(client_id): Path<String>,
    Json(request): Json<UpdateConsultantLevelRequest>,
) -> Result<Json<Client>, ApiError> {
    let client = state
        .account_service
        .update_consultant_level(&client_id, request)
        .await?;
    Ok(Json(client))
}
