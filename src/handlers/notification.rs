// src/handlers/notification.rs

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::{
        auth::Role,
        notification::{
            BroadcastPayload, Notification, NotificationListQuery, NotificationType, NotifyInput,
            UnreadCountResponse,
        },
    },
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(NotificationListQuery),
    responses((status = 200, description = "Últimas notificações do usuário", body = Vec<Notification>)),
    security(("api_jwt" = []))
)]
pub async fn list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let rows = app_state
        .notification_repo
        .list_for_user(user.id, query.include_cleared)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "Notifications",
    responses((status = 200, description = "Total de não lidas", body = UnreadCountResponse)),
    security(("api_jwt" = []))
)]
pub async fn unread_count(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let count = app_state.notification_repo.unread_count(user.id).await?;
    Ok(Json(UnreadCountResponse { success: true, count }))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = i64, Path, description = "ID da notificação")),
    responses((status = 200, description = "Marcada como lida"), (status = 404, description = "Não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let affected = app_state.notification_repo.mark_read(id, user.id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("Notificação"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    tag = "Notifications",
    responses((status = 200, description = "Todas marcadas como lidas")),
    security(("api_jwt" = []))
)]
pub async fn mark_all_read(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let affected = app_state.notification_repo.mark_all_read(user.id).await?;
    Ok(Json(serde_json::json!({ "success": true, "updated": affected })))
}

// Limpeza é um flag; a notificação continua no histórico.
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    tag = "Notifications",
    params(("id" = i64, Path, description = "ID da notificação")),
    responses((status = 200, description = "Notificação limpa")),
    security(("api_jwt" = []))
)]
pub async fn clear_one(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let affected = app_state.notification_repo.set_cleared(id, user.id, true).await?;
    if affected == 0 {
        return Err(AppError::NotFound("Notificação"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/restore",
    tag = "Notifications",
    params(("id" = i64, Path, description = "ID da notificação")),
    responses((status = 200, description = "Notificação restaurada")),
    security(("api_jwt" = []))
)]
pub async fn restore(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let affected = app_state.notification_repo.set_cleared(id, user.id, false).await?;
    if affected == 0 {
        return Err(AppError::NotFound("Notificação"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    delete,
    path = "/api/notifications",
    tag = "Notifications",
    responses((status = 200, description = "Todas as notificações limpas")),
    security(("api_jwt" = []))
)]
pub async fn clear_all(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let affected = app_state.notification_repo.clear_all(user.id).await?;
    Ok(Json(serde_json::json!({ "success": true, "cleared": affected })))
}

// Broadcast administrativo: lista explícita de usuários ou um papel inteiro.
#[utoipa::path(
    post,
    path = "/api/notifications/broadcast",
    tag = "Notifications",
    request_body = BroadcastPayload,
    responses((status = 200, description = "Notificações disparadas")),
    security(("api_jwt" = []))
)]
pub async fn broadcast(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<BroadcastPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let mut input = NotifyInput::new(
        payload.kind.unwrap_or(NotificationType::System),
        payload.title.clone(),
        payload.message.clone(),
    );
    if let Some(link) = &payload.link {
        input = input.with_link(link.clone());
    }
    if !payload.images.is_empty() || !payload.videos.is_empty() {
        input = input.with_metadata(serde_json::json!({
            "images": payload.images,
            "videos": payload.videos,
        }));
    }

    let sent = match &payload.target_users {
        Some(users) if !users.is_empty() => {
            app_state.notification_service.notify_many(users, input).await?
        }
        _ => {
            let role = payload.target_role.unwrap_or(Role::Vendor);
            app_state.notification_service.notify_role(role, input).await?
        }
    };

    tracing::info!("📣 Broadcast '{}' para {} usuários", payload.title, sent.len());
    Ok(Json(serde_json::json!({ "success": true, "sent": sent.len() })))
}
