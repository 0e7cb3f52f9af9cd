// src/handlers/settings.rs
// Configurações exibidas no site (telefone de suporte, e-mail, WhatsApp).

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::settings_repo::KNOWN_KEYS,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::settings::{SettingResponse, SystemSetting, UpdateSettingPayload},
};

#[utoipa::path(
    get,
    path = "/api/settings/public/{key}",
    tag = "Settings",
    params(("key" = String, Path, description = "Chave da configuração")),
    responses(
        (status = 200, description = "Valor atual", body = SettingResponse),
        (status = 404, description = "Chave desconhecida ou sem valor")
    )
)]
pub async fn get_public(
    State(app_state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SettingResponse>, AppError> {
    if !KNOWN_KEYS.contains(&key.as_str()) {
        return Err(AppError::NotFound("Configuração"));
    }
    let setting = app_state
        .settings_repo
        .get(&key)
        .await?
        .ok_or(AppError::NotFound("Configuração"))?;
    Ok(Json(SettingResponse { success: true, value: setting.setting_value }))
}

#[utoipa::path(
    get,
    path = "/api/settings/admin",
    tag = "Settings",
    responses((status = 200, description = "Todas as configurações", body = Vec<SystemSetting>)),
    security(("api_jwt" = []))
)]
pub async fn list_admin(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
) -> Result<Json<Vec<SystemSetting>>, AppError> {
    let rows = app_state.settings_repo.list().await?;
    Ok(Json(rows))
}

#[utoipa::path(
    put,
    path = "/api/settings/admin/{key}",
    tag = "Settings",
    params(("key" = String, Path, description = "Chave da configuração")),
    request_body = UpdateSettingPayload,
    responses(
        (status = 200, description = "Configuração gravada", body = SystemSetting),
        (status = 400, description = "Chave desconhecida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(key): Path<String>,
    Json(payload): Json<UpdateSettingPayload>,
) -> Result<Json<SystemSetting>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    if !KNOWN_KEYS.contains(&key.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Chave de configuração desconhecida: {key}"
        )));
    }

    let setting = app_state
        .settings_repo
        .upsert(&key, payload.value.trim(), Some(&user.name))
        .await?;

    tracing::info!("⚙️ Configuração {} atualizada por {}", key, user.name);
    Ok(Json(setting))
}
