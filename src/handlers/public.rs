// src/handlers/public.rs
// Endpoints sem autenticação: health check e os dados que o formulário
// público de garantia precisa (lojas verificadas e seus instaladores).

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::vendor::{Manpower, PublicStore},
};

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Public",
    responses((status = 200, description = "Serviço no ar"))
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[utoipa::path(
    get,
    path = "/api/public/stores",
    tag = "Public",
    responses((status = 200, description = "Lojas verificadas", body = Vec<PublicStore>))
)]
pub async fn list_stores(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<PublicStore>>, AppError> {
    let rows = app_state.vendor_repo.list_public_stores().await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/public/stores/{id}/manpower",
    tag = "Public",
    params(("id" = Uuid, Path, description = "ID da loja")),
    responses((status = 200, description = "Instaladores ativos da loja", body = Vec<Manpower>))
)]
pub async fn list_store_manpower(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Manpower>>, AppError> {
    let rows = app_state.vendor_repo.list_manpower(id, true).await?;
    Ok(Json(rows))
}
