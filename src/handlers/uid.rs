// src/handlers/uid.rs
// Pool de UIDs: sincronização externa, validação e administração.

use std::collections::{HashMap, HashSet};

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::{
    common::{
        csv,
        error::AppError,
        pagination::{PageInfo, PaginationQuery},
    },
    config::AppState,
    middleware::rbac::{AdminOnly, RequireRole},
    models::{
        uid::{
            AddUidPayload, PreGeneratedUid, SyncDetail, SyncOutcome, SyncResponse, SyncStats,
            SyncUidsPayload, UidFilterQuery, UidPoolStats, ValidateUidResponse,
        },
        warranty::is_valid_uid,
    },
};

const MAX_SYNC_BATCH: usize = 1000;

// POST /api/uid/sync (autenticado por x-api-key, não por JWT).
// Classifica cada UID do lote; os novos válidos entram em uma transação só,
// então reenviar um lote já sincronizado é inofensivo.
#[utoipa::path(
    post,
    path = "/api/uid/sync",
    tag = "UID",
    request_body = SyncUidsPayload,
    responses(
        (status = 200, description = "Resultado da sincronização", body = SyncResponse),
        (status = 400, description = "Lote vazio ou acima do limite"),
        (status = 403, description = "x-api-key ausente ou inválida")
    )
)]
pub async fn sync(
    State(app_state): State<AppState>,
    Json(payload): Json<SyncUidsPayload>,
) -> Result<Json<SyncResponse>, AppError> {
    if payload.uids.is_empty() {
        return Err(AppError::BadRequest("O lote de UIDs está vazio.".to_string()));
    }
    if payload.uids.len() > MAX_SYNC_BATCH {
        return Err(AppError::BadRequest(format!(
            "Máximo de {MAX_SYNC_BATCH} UIDs por lote."
        )));
    }

    // Estado atual dos UIDs já conhecidos, em uma única consulta.
    let valid_candidates: Vec<String> = payload
        .uids
        .iter()
        .filter(|u| is_valid_uid(u))
        .cloned()
        .collect();
    let existing = app_state.uid_repo.find_many_with_usage(&valid_candidates).await?;
    let existing_by_uid: HashMap<&str, _> =
        existing.iter().map(|row| (row.uid.as_str(), row)).collect();

    let mut stats = SyncStats { total_received: payload.uids.len(), ..Default::default() };
    let mut details = Vec::with_capacity(payload.uids.len());
    let mut seen = HashSet::new();
    let mut to_insert = Vec::new();

    for uid in &payload.uids {
        if !is_valid_uid(uid) {
            stats.invalid_format += 1;
            details.push(SyncDetail {
                uid: uid.clone(),
                status: SyncOutcome::InvalidFormat,
                message: "O UID deve ser um número de 13 a 16 dígitos.".to_string(),
                info: None,
            });
            continue;
        }
        if !seen.insert(uid.clone()) {
            stats.duplicate_in_request += 1;
            details.push(SyncDetail {
                uid: uid.clone(),
                status: SyncOutcome::DuplicateInRequest,
                message: "UID repetido dentro do próprio lote.".to_string(),
                info: None,
            });
            continue;
        }
        match existing_by_uid.get(uid.as_str()) {
            Some(row) if row.is_used => {
                stats.already_exists_used += 1;
                details.push(SyncDetail {
                    uid: uid.clone(),
                    status: SyncOutcome::AlreadyExistsUsed,
                    message: "UID já consumido por uma garantia.".to_string(),
                    info: Some(serde_json::json!({
                        "customerName": row.customer_name,
                        "registrationNumber": row.registration_number,
                        "usedAt": row.used_at,
                    })),
                });
            }
            Some(_) => {
                stats.already_exists_available += 1;
                details.push(SyncDetail {
                    uid: uid.clone(),
                    status: SyncOutcome::AlreadyExistsAvailable,
                    message: "UID já sincronizado e ainda disponível.".to_string(),
                    info: None,
                });
            }
            None => {
                to_insert.push(uid.clone());
                details.push(SyncDetail {
                    uid: uid.clone(),
                    status: SyncOutcome::Inserted,
                    message: "UID adicionado ao pool.".to_string(),
                    info: None,
                });
            }
        }
    }

    if !to_insert.is_empty() {
        let mut tx = app_state.db_pool.begin().await?;
        let inserted = app_state.uid_repo.insert_batch(&mut *tx, &to_insert).await?;
        tx.commit().await?;
        stats.inserted = inserted as usize;
    }

    tracing::info!(
        "🔄 Sync de UIDs: {} recebidos, {} inseridos, {} inválidos",
        stats.total_received,
        stats.inserted,
        stats.invalid_format
    );

    Ok(Json(SyncResponse {
        success: true,
        message: format!("{} UIDs processados.", stats.total_received),
        stats,
        details,
    }))
}

#[utoipa::path(
    get,
    path = "/api/uid/validate/{uid}",
    tag = "UID",
    params(("uid" = String, Path, description = "UID a validar")),
    responses((status = 200, description = "Estado do UID", body = ValidateUidResponse)),
    security(("api_jwt" = []))
)]
pub async fn validate(
    State(app_state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<ValidateUidResponse>, AppError> {
    if !is_valid_uid(&uid) {
        return Ok(Json(ValidateUidResponse {
            valid: false,
            available: false,
            message: "O UID deve ser um número de 13 a 16 dígitos.".to_string(),
        }));
    }

    let response = match app_state.uid_repo.find(&uid).await? {
        None => ValidateUidResponse {
            valid: false,
            available: false,
            message: "UID não encontrado no pool.".to_string(),
        },
        Some(PreGeneratedUid { is_used: true, .. }) => ValidateUidResponse {
            valid: true,
            available: false,
            message: "UID já utilizado em outra garantia.".to_string(),
        },
        Some(_) => ValidateUidResponse {
            valid: true,
            available: true,
            message: "UID disponível.".to_string(),
        },
    };
    Ok(Json(response))
}

// ---
// Administração do pool
// ---

#[utoipa::path(
    get,
    path = "/api/uid",
    tag = "UID",
    params(UidFilterQuery),
    responses((status = 200, description = "Listagem do pool com estatísticas")),
    security(("api_jwt" = []))
)]
pub async fn list(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Query(filter): Query<UidFilterQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (rows, total) = app_state.uid_repo.list(&filter).await?;
    let stats: UidPoolStats = app_state.uid_repo.stats().await?;
    let page = PaginationQuery { page: filter.page, limit: filter.limit };

    Ok(Json(serde_json::json!({
        "success": true,
        "data": rows,
        "stats": stats,
        "pagination": PageInfo::new(&page, total),
    })))
}

// Export CSV com o mesmo filtro da listagem.
#[utoipa::path(
    get,
    path = "/api/uid/export",
    tag = "UID",
    params(UidFilterQuery),
    responses((status = 200, description = "CSV do pool", content_type = "text/csv")),
    security(("api_jwt" = []))
)]
pub async fn export(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Query(filter): Query<UidFilterQuery>,
) -> Result<axum::response::Response, AppError> {
    let rows = app_state.uid_repo.list_for_export(&filter).await?;

    let mut body = String::new();
    csv::push_row(&mut body, &["uid", "status", "used_at", "customer_name", "registration_number", "created_at"]);
    for row in &rows {
        csv::push_row(
            &mut body,
            &[
                &row.uid,
                if row.is_used { "used" } else { "available" },
                &row.used_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
                row.customer_name.as_deref().unwrap_or(""),
                row.registration_number.as_deref().unwrap_or(""),
                &row.created_at.to_rfc3339(),
            ],
        );
    }

    let response = axum::response::Response::builder()
        .header("Content-Type", "text/csv; charset=utf-8")
        .header("Content-Disposition", "attachment; filename=\"uids.csv\"")
        .body(axum::body::Body::from(body))
        .map_err(|e| anyhow::anyhow!("Falha ao montar resposta CSV: {}", e))?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/uid/add",
    tag = "UID",
    request_body = AddUidPayload,
    responses(
        (status = 201, description = "UID adicionado", body = PreGeneratedUid),
        (status = 409, description = "UID já existente")
    ),
    security(("api_jwt" = []))
)]
pub async fn add(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<AddUidPayload>,
) -> Result<(axum::http::StatusCode, Json<PreGeneratedUid>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let row = app_state.uid_repo.insert_one(&payload.uid).await?;
    Ok((axum::http::StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    delete,
    path = "/api/uid/{uid}",
    tag = "UID",
    params(("uid" = String, Path, description = "UID a remover")),
    responses(
        (status = 200, description = "UID removido"),
        (status = 400, description = "UID já utilizado, remoção recusada"),
        (status = 404, description = "UID não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(uid): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state.uid_repo.delete_unused(&uid).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
