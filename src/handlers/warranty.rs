// src/handlers/warranty.rs

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::{PageInfo, PaginationQuery}},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::Role,
        warranty::{SubmitWarrantyPayload, WarrantyRegistration},
    },
};

// Submissão autenticada: consome um UID do pool.
#[utoipa::path(
    post,
    path = "/api/warranty/submit",
    tag = "Warranty",
    request_body = SubmitWarrantyPayload,
    responses(
        (status = 201, description = "Garantia registrada", body = WarrantyRegistration),
        (status = 400, description = "UID desconhecido ou payload inválido"),
        (status = 409, description = "UID já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<SubmitWarrantyPayload>,
) -> Result<(axum::http::StatusCode, Json<WarrantyRegistration>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let registration = app_state
        .warranty_service
        .submit(user.id, user.role, &payload)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(registration)))
}

// Listagem por papel: cliente vê as suas, vendor vê as da loja.
#[utoipa::path(
    get,
    path = "/api/warranty",
    tag = "Warranty",
    params(PaginationQuery),
    responses((status = 200, description = "Garantias visíveis para o usuário")),
    security(("api_jwt" = []))
)]
pub async fn list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (rows, total) = match user.role {
        Role::Vendor => {
            let details = app_state
                .vendor_repo
                .find_by_user_id(user.id)
                .await?
                .ok_or(AppError::NotFound("Loja do vendor"))?;
            app_state
                .warranty_repo
                .list_for_vendor(user.id, details.id, &page)
                .await?
        }
        _ => app_state.warranty_repo.list_for_user(user.id, &page).await?,
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "data": rows,
        "pagination": PageInfo::new(&page, total),
    })))
}

#[utoipa::path(
    get,
    path = "/api/warranty/{uid}",
    tag = "Warranty",
    params(("uid" = String, Path, description = "UID da garantia")),
    responses(
        (status = 200, description = "Detalhe da garantia", body = WarrantyRegistration),
        (status = 403, description = "Sem acesso a este registro"),
        (status = 404, description = "Garantia não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_by_uid(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(uid): Path<String>,
) -> Result<Json<WarrantyRegistration>, AppError> {
    let registration = app_state
        .warranty_repo
        .find_by_uid(&uid)
        .await?
        .ok_or(AppError::NotFound("Garantia"))?;

    app_state
        .warranty_service
        .authorize_view(&registration, user.id, user.role)
        .await?;

    Ok(Json(registration))
}
