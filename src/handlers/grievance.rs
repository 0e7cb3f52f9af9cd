// src/handlers/grievance.rs

use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{PageInfo, PaginationQuery},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole, VendorOnly},
    },
    models::{
        auth::Role,
        grievance::{
            AddRemarkPayload, AdminUpdateGrievancePayload, Grievance, GrievanceAssignment,
            GrievanceFilterQuery, GrievanceRemark, RatingPayload, SendAssignmentPayload,
            SubmitFranchiseGrievancePayload, SubmitGrievancePayload, UpdateGrievanceStatusPayload,
        },
    },
};

#[utoipa::path(
    post,
    path = "/api/grievance",
    tag = "Grievance",
    request_body = SubmitGrievancePayload,
    responses((status = 201, description = "Chamado aberto", body = Grievance)),
    security(("api_jwt" = []))
)]
pub async fn submit(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<SubmitGrievancePayload>,
) -> Result<(axum::http::StatusCode, Json<Grievance>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let grievance = app_state.grievance_service.submit(user.id, &payload).await?;
    Ok((axum::http::StatusCode::CREATED, Json(grievance)))
}

#[utoipa::path(
    post,
    path = "/api/grievance/franchise",
    tag = "Grievance",
    request_body = SubmitFranchiseGrievancePayload,
    responses((status = 201, description = "Chamado de franquia aberto", body = Grievance)),
    security(("api_jwt" = []))
)]
pub async fn submit_franchise(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
    Json(payload): Json<SubmitFranchiseGrievancePayload>,
) -> Result<(axum::http::StatusCode, Json<Grievance>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let grievance = app_state
        .grievance_service
        .submit_franchise(user.id, &payload)
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(grievance)))
}

// Chamados abertos pelo próprio usuário (cliente ou franquia).
#[utoipa::path(
    get,
    path = "/api/grievance",
    tag = "Grievance",
    responses((status = 200, description = "Chamados do usuário", body = Vec<Grievance>)),
    security(("api_jwt" = []))
)]
pub async fn list_own(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Grievance>>, AppError> {
    let rows = app_state.grievance_repo.list_for_user(user.id).await?;
    Ok(Json(rows))
}

// Chamados que a franquia abriu junto à matriz.
#[utoipa::path(
    get,
    path = "/api/grievance/franchise/submitted",
    tag = "Grievance",
    responses((status = 200, description = "Chamados abertos pela franquia", body = Vec<Grievance>)),
    security(("api_jwt" = []))
)]
pub async fn list_franchise_submitted(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
) -> Result<Json<Vec<Grievance>>, AppError> {
    let rows = app_state.grievance_repo.list_franchise_submitted(user.id).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/grievance/admin",
    tag = "Grievance",
    params(GrievanceFilterQuery),
    responses((status = 200, description = "Todos os chamados, filtráveis")),
    security(("api_jwt" = []))
)]
pub async fn list_admin(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Query(filter): Query<GrievanceFilterQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (rows, total) = app_state.grievance_repo.list_all(&filter).await?;
    let page = PaginationQuery { page: filter.page, limit: filter.limit };
    Ok(Json(serde_json::json!({
        "success": true,
        "data": rows,
        "pagination": PageInfo::new(&page, total),
    })))
}

// Detalhe com histórico de atribuições e comentários. Dono, loja
// reclamada ou admin.
#[utoipa::path(
    get,
    path = "/api/grievance/{id}",
    tag = "Grievance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Detalhe do chamado"),
        (status = 403, description = "Sem acesso a este chamado"),
        (status = 404, description = "Chamado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_detail(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let grievance = app_state
        .grievance_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Chamado"))?;

    authorize_grievance_view(&app_state, &grievance, &user).await?;

    let assignments = app_state.grievance_repo.list_assignments(id).await?;
    let remarks = app_state.grievance_repo.list_remarks(id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": grievance,
        "assignments": assignments,
        "remarks": remarks,
    })))
}

async fn authorize_grievance_view(
    app_state: &AppState,
    grievance: &Grievance,
    user: &crate::models::auth::AuthUser,
) -> Result<(), AppError> {
    match user.role {
        Role::Admin => Ok(()),
        _ if grievance.customer_id == user.id => Ok(()),
        Role::Vendor => {
            let details = app_state.vendor_repo.find_by_user_id(user.id).await?;
            if details.map(|d| Some(d.id) == grievance.franchise_id).unwrap_or(false) {
                Ok(())
            } else {
                Err(AppError::Forbidden("Você não tem acesso a este chamado.".to_string()))
            }
        }
        _ => Err(AppError::Forbidden("Você não tem acesso a este chamado.".to_string())),
    }
}

// Chamados de clientes contra a loja do vendor.
#[utoipa::path(
    get,
    path = "/api/grievance/vendor",
    tag = "Grievance",
    responses((status = 200, description = "Chamados contra a loja", body = Vec<Grievance>)),
    security(("api_jwt" = []))
)]
pub async fn list_for_vendor(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
) -> Result<Json<Vec<Grievance>>, AppError> {
    let details = app_state
        .vendor_repo
        .find_by_user_id(user.id)
        .await?
        .ok_or(AppError::NotFound("Loja do vendor"))?;
    let rows = app_state.grievance_repo.list_for_franchise(details.id).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    put,
    path = "/api/grievance/{id}/status",
    tag = "Grievance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    request_body = UpdateGrievanceStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Grievance),
        (status = 400, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGrievanceStatusPayload>,
) -> Result<Json<Grievance>, AppError> {
    if user.role == Role::Customer {
        return Err(AppError::Forbidden(
            "Apenas vendors e admins alteram o status de chamados.".to_string(),
        ));
    }
    let Some(next) = payload.status else {
        return Err(AppError::BadRequest("O novo status é obrigatório.".to_string()));
    };
    let updated = app_state
        .grievance_service
        .update_status(id, next, payload.priority.as_deref())
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    put,
    path = "/api/grievance/{id}/admin-update",
    tag = "Grievance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    request_body = AdminUpdateGrievancePayload,
    responses((status = 200, description = "Chamado atualizado", body = Grievance)),
    security(("api_jwt" = []))
)]
pub async fn admin_update(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUpdateGrievancePayload>,
) -> Result<Json<Grievance>, AppError> {
    let updated = app_state
        .grievance_repo
        .admin_update(
            id,
            payload.category.as_deref(),
            payload.priority.as_deref(),
            payload.admin_notes.as_deref(),
        )
        .await?
        .ok_or(AppError::NotFound("Chamado"))?;
    Ok(Json(updated))
}

#[utoipa::path(
    put,
    path = "/api/grievance/{id}/remarks",
    tag = "Grievance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    request_body = AddRemarkPayload,
    responses((status = 201, description = "Comentário registrado", body = GrievanceRemark)),
    security(("api_jwt" = []))
)]
pub async fn add_remark(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddRemarkPayload>,
) -> Result<(axum::http::StatusCode, Json<GrievanceRemark>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let grievance = app_state
        .grievance_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Chamado"))?;
    authorize_grievance_view(&app_state, &grievance, &user).await?;

    let remark = app_state
        .grievance_repo
        .add_remark(id, Some(user.id), Some(user.role), payload.remark.trim())
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(remark)))
}

#[utoipa::path(
    get,
    path = "/api/grievance/{id}/remarks",
    tag = "Grievance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses((status = 200, description = "Comentários do chamado", body = Vec<GrievanceRemark>)),
    security(("api_jwt" = []))
)]
pub async fn list_remarks(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GrievanceRemark>>, AppError> {
    let grievance = app_state
        .grievance_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Chamado"))?;
    authorize_grievance_view(&app_state, &grievance, &user).await?;

    let remarks = app_state.grievance_repo.list_remarks(id).await?;
    Ok(Json(remarks))
}

// Avaliação única, pelo dono, com o chamado resolvido.
#[utoipa::path(
    put,
    path = "/api/grievance/{id}/rating",
    tag = "Grievance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    request_body = RatingPayload,
    responses(
        (status = 200, description = "Avaliação registrada"),
        (status = 400, description = "Chamado não resolvido ou já avaliado")
    ),
    security(("api_jwt" = []))
)]
pub async fn rate(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RatingPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let affected = app_state
        .grievance_repo
        .set_rating(id, user.id, payload.rating)
        .await?;
    if affected == 0 {
        return Err(AppError::BadRequest(
            "Só é possível avaliar uma vez um chamado resolvido que seja seu.".to_string(),
        ));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

// ---
// Atribuição a responsáveis externos
// ---

#[utoipa::path(
    post,
    path = "/api/grievance/{id}/send-assignment-email",
    tag = "Grievance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    request_body = SendAssignmentPayload,
    responses(
        (status = 201, description = "Atribuição registrada e e-mail enviado", body = GrievanceAssignment),
        (status = 400, description = "Chamado encerrado ou prazo no passado")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_assignment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendAssignmentPayload>,
) -> Result<(axum::http::StatusCode, Json<GrievanceAssignment>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let assignment = app_state
        .grievance_service
        .send_assignment(id, user.id, &user.name, &payload)
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(assignment)))
}

#[utoipa::path(
    get,
    path = "/api/grievance/{id}/assignments",
    tag = "Grievance",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses((status = 200, description = "Histórico de atribuições", body = Vec<GrievanceAssignment>)),
    security(("api_jwt" = []))
)]
pub async fn list_assignments(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GrievanceAssignment>>, AppError> {
    let rows = app_state.grievance_repo.list_assignments(id).await?;
    Ok(Json(rows))
}
