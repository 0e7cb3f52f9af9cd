// src/handlers/posm.rs
// Tickets de material de ponto de venda, com chat entre franquia e admin.

use axum::{
    Json,
    extract::{Path, Query, State},
};
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
        notification::{NotificationType, NotifyInput},
        posm::{
            PosmMessagePayload, PosmRequest, PosmSenderRole, PosmStatus, PosmTicketView,
            SubmitPosmPayload, UpdatePosmPayload,
        },
    },
    services::grievance::generate_ticket_id,
};

#[derive(Debug, Default, serde::Deserialize, utoipa::IntoParams)]
pub struct PosmListQuery {
    pub status: Option<PosmStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/api/posm",
    tag = "POSM",
    request_body = SubmitPosmPayload,
    responses((status = 201, description = "Ticket aberto", body = PosmRequest)),
    security(("api_jwt" = []))
)]
pub async fn submit(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
    Json(payload): Json<SubmitPosmPayload>,
) -> Result<(axum::http::StatusCode, Json<PosmRequest>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let details = app_state
        .vendor_repo
        .find_by_user_id(user.id)
        .await?
        .ok_or(AppError::NotFound("Loja do vendor"))?;

    let ticket_id = generate_ticket_id("PO");
    let mut tx = app_state.db_pool.begin().await?;
    let request = app_state
        .posm_repo
        .create(&mut *tx, &ticket_id, details.id, &payload)
        .await?;
    // O requisito e os anexos viram a primeira mensagem do chat.
    app_state
        .posm_repo
        .add_message(
            &mut *tx,
            request.id,
            user.id,
            PosmSenderRole::Franchise,
            Some(&payload.requirement),
            &payload.attachments,
        )
        .await?;
    tx.commit().await?;

    tracing::info!("🧾 Ticket POSM {} aberto pela loja {}", ticket_id, details.store_name);

    let input = NotifyInput::new(
        NotificationType::Posm,
        "Novo ticket de POSM",
        format!("{} abriu o ticket {}.", details.store_name, ticket_id),
    )
    .with_link(format!("/admin/posm/{}", request.id));
    if let Err(e) = app_state.notification_service.notify_admins(input).await {
        tracing::warn!("⚠️ Falha ao notificar admins do POSM: {:?}", e);
    }
    if let Err(e) = app_state
        .activity_repo
        .record(None, "posm_submitted", Some("posm_request"), Some(&ticket_id), None)
        .await
    {
        tracing::warn!("⚠️ Falha ao gravar activity_log: {:?}", e);
    }

    Ok((axum::http::StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/posm",
    tag = "POSM",
    responses((status = 200, description = "Tickets da franquia", body = Vec<PosmRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list_own(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
) -> Result<Json<Vec<PosmRequest>>, AppError> {
    let details = app_state
        .vendor_repo
        .find_by_user_id(user.id)
        .await?
        .ok_or(AppError::NotFound("Loja do vendor"))?;
    let rows = app_state.posm_repo.list_for_franchise(details.id).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/posm/admin/all",
    tag = "POSM",
    params(PosmListQuery),
    responses((status = 200, description = "Todos os tickets")),
    security(("api_jwt" = []))
)]
pub async fn list_admin(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Query(query): Query<PosmListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let page = PaginationQuery { page: query.page, limit: query.limit };
    let (rows, total) = app_state.posm_repo.list_all(query.status, &page).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": rows,
        "pagination": PageInfo::new(&page, total),
    })))
}

#[utoipa::path(
    get,
    path = "/api/posm/{id}",
    tag = "POSM",
    params(("id" = i64, Path, description = "ID do ticket")),
    responses(
        (status = 200, description = "Ticket com o chat completo", body = PosmTicketView),
        (status = 403, description = "Ticket de outra franquia"),
        (status = 404, description = "Ticket não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_detail(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<PosmTicketView>, AppError> {
    let request = app_state
        .posm_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Ticket POSM"))?;

    authorize_ticket(&app_state, &request, &user).await?;

    let store_name = app_state
        .posm_repo
        .store_name(request.franchise_id)
        .await?
        .unwrap_or_default();
    let messages = app_state.posm_repo.list_messages(id).await?;

    Ok(Json(PosmTicketView { request, store_name, messages }))
}

async fn authorize_ticket(
    app_state: &AppState,
    request: &PosmRequest,
    user: &crate::models::auth::AuthUser,
) -> Result<(), AppError> {
    if user.role == Role::Admin {
        return Ok(());
    }
    let details = app_state.vendor_repo.find_by_user_id(user.id).await?;
    if details.map(|d| d.id == request.franchise_id).unwrap_or(false) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Você não tem acesso a este ticket.".to_string()))
    }
}

// Chat: qualquer lado escreve; o outro lado é notificado.
#[utoipa::path(
    post,
    path = "/api/posm/{id}/messages",
    tag = "POSM",
    params(("id" = i64, Path, description = "ID do ticket")),
    request_body = PosmMessagePayload,
    responses(
        (status = 201, description = "Mensagem registrada"),
        (status = 400, description = "Mensagem e anexos vazios")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_message(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<PosmMessagePayload>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    if payload.message.as_deref().map(str::trim).unwrap_or("").is_empty()
        && payload.attachments.is_empty()
    {
        return Err(AppError::BadRequest(
            "Envie uma mensagem ou pelo menos um anexo.".to_string(),
        ));
    }

    let request = app_state
        .posm_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Ticket POSM"))?;
    authorize_ticket(&app_state, &request, &user).await?;

    let sender_role = if user.role == Role::Admin {
        PosmSenderRole::Admin
    } else {
        PosmSenderRole::Franchise
    };

    let mut tx = app_state.db_pool.begin().await?;
    let message = app_state
        .posm_repo
        .add_message(
            &mut *tx,
            id,
            user.id,
            sender_role,
            payload.message.as_deref(),
            &payload.attachments,
        )
        .await?;
    app_state.posm_repo.touch(&mut *tx, id).await?;
    tx.commit().await?;

    // Notifica a outra ponta da conversa.
    let input = NotifyInput::new(
        NotificationType::Posm,
        "Nova mensagem no ticket POSM",
        format!("Ticket {} recebeu uma resposta.", request.ticket_id),
    )
    .with_link(format!("/posm/{}", request.id));
    let notify_result = match sender_role {
        PosmSenderRole::Admin => {
            // Destino: o dono da loja do ticket.
            match app_state.vendor_repo.find_by_id(request.franchise_id).await? {
                Some(details) => app_state
                    .notification_service
                    .notify(details.user_id, input)
                    .await
                    .map(|_| ()),
                None => Ok(()),
            }
        }
        PosmSenderRole::Franchise => {
            app_state.notification_service.notify_admins(input).await
        }
    };
    if let Err(e) = notify_result {
        tracing::warn!("⚠️ Falha ao notificar contraparte do POSM: {:?}", e);
    }

    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "data": message })),
    ))
}

#[utoipa::path(
    put,
    path = "/api/posm/{id}/status",
    tag = "POSM",
    params(("id" = i64, Path, description = "ID do ticket")),
    request_body = UpdatePosmPayload,
    responses((status = 200, description = "Status atualizado", body = PosmRequest)),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePosmPayload>,
) -> Result<Json<PosmRequest>, AppError> {
    let updated = app_state
        .posm_repo
        .update(id, &payload)
        .await?
        .ok_or(AppError::NotFound("Ticket POSM"))?;

    tracing::info!("🧾 Ticket POSM {} movido para {:?}", updated.ticket_id, updated.status);

    let input = NotifyInput::new(
        NotificationType::Posm,
        "Ticket POSM atualizado",
        format!("O ticket {} agora está {:?}.", updated.ticket_id, updated.status),
    )
    .with_link(format!("/posm/{}", updated.id));
    if let Some(details) = app_state.vendor_repo.find_by_id(updated.franchise_id).await? {
        if let Err(e) = app_state.notification_service.notify(details.user_id, input).await {
            tracing::warn!("⚠️ Falha ao notificar franquia do POSM: {:?}", e);
        }
    }
    if let Err(e) = app_state
        .activity_repo
        .record(
            Some(user.id),
            "posm_status_updated",
            Some("posm_request"),
            Some(&updated.ticket_id),
            Some(serde_json::json!({ "status": updated.status })),
        )
        .await
    {
        tracing::warn!("⚠️ Falha ao gravar activity_log: {:?}", e);
    }

    Ok(Json(updated))
}
