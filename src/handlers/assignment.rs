// src/handlers/assignment.rs
// Portal público do responsável externo. Sem JWT: o token opaco do e-mail
// é a credencial, e só dá acesso ao chamado atribuído.

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::grievance::{AssignmentPortalView, AssignmentUpdatePayload},
};

#[utoipa::path(
    get,
    path = "/api/assignment/details/{token}",
    tag = "Assignment",
    params(("token" = String, Path, description = "Token de atualização do e-mail")),
    responses(
        (status = 200, description = "Contexto da atribuição", body = AssignmentPortalView),
        (status = 404, description = "Token desconhecido")
    )
)]
pub async fn details(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<AssignmentPortalView>, AppError> {
    let view = app_state.grievance_service.portal_view(&token).await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/assignment/update/{token}",
    tag = "Assignment",
    params(("token" = String, Path, description = "Token de atualização do e-mail")),
    request_body = AssignmentUpdatePayload,
    responses(
        (status = 200, description = "Andamento registrado"),
        (status = 400, description = "Chamado já encerrado"),
        (status = 404, description = "Token desconhecido")
    )
)]
pub async fn update(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<AssignmentUpdatePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let grievance = app_state.grievance_service.portal_update(&token, &payload).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "ticketId": grievance.ticket_id,
        "status": grievance.status,
    })))
}
