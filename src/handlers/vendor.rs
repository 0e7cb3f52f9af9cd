// src/handlers/vendor.rs
// Área logada do vendor: perfil da loja e gestão de instaladores.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Html,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, VendorOnly},
    },
    models::{
        notification::{NotificationType, NotifyInput},
        vendor::{
            CreateManpowerPayload, Manpower, UpdateManpowerPayload, VendorProfileView,
            VerifyTokenQuery,
        },
        warranty::{RejectWarrantyPayload, WarrantyRegistration},
    },
    services::messaging,
};

// Link de verificação enviado por e-mail ao admin. Resposta em HTML
// porque quem abre é um navegador, não o front.
#[utoipa::path(
    get,
    path = "/api/vendor/verify",
    tag = "Vendor",
    params(VerifyTokenQuery),
    responses((status = 200, description = "Página HTML com o resultado da verificação"))
)]
pub async fn verify(
    State(app_state): State<AppState>,
    Query(query): Query<VerifyTokenQuery>,
) -> Result<Html<String>, AppError> {
    let Some(verification) = app_state
        .user_repo
        .find_verification_by_token(&query.token)
        .await?
    else {
        return Ok(Html(verify_page(
            "Link inválido",
            "Este link de verificação não existe ou já foi substituído.",
        )));
    };

    // Idempotente: reabrir o link não muda nada.
    if verification.is_verified {
        return Ok(Html(verify_page(
            "Loja já verificada",
            "Esta loja já havia sido verificada. Nenhuma ação é necessária.",
        )));
    }

    app_state.user_repo.set_verified(verification.user_id, true).await?;

    let profile = app_state.user_repo.find_by_id(verification.user_id).await?;
    let details = app_state.vendor_repo.find_by_user_id(verification.user_id).await?;
    if let (Some(profile), Some(details)) = (profile, details) {
        tracing::info!("🏪 Loja {} verificada via link de e-mail", details.store_name);

        let (subject, html) =
            messaging::vendor_verified_email(&profile.name, &details.store_name);
        if let Err(e) = app_state
            .mailer
            .send(
                &profile.email,
                &subject,
                html,
                "vendor_verified",
                Some(verification.user_id.to_string()),
            )
            .await
        {
            tracing::warn!("⚠️ E-mail de verificação não enviado: {:?}", e);
        }

        let input = NotifyInput::new(
            NotificationType::System,
            "Loja verificada",
            format!("{} foi aprovada e já pode operar no portal.", details.store_name),
        );
        if let Err(e) = app_state
            .notification_service
            .notify(verification.user_id, input)
            .await
        {
            tracing::warn!("⚠️ Falha ao notificar vendor verificado: {:?}", e);
        }
    }

    Ok(Html(verify_page(
        "Loja verificada",
        "A loja foi verificada com sucesso e já pode operar no portal.",
    )))
}

fn verify_page(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="pt-BR">
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family:sans-serif;max-width:480px;margin:80px auto;text-align:center">
    <h2>{title}</h2>
    <p>{body}</p>
</body>
</html>"#
    )
}

#[utoipa::path(
    get,
    path = "/api/vendor/profile",
    tag = "Vendor",
    responses(
        (status = 200, description = "Perfil da loja", body = VendorProfileView),
        (status = 404, description = "Perfil de loja não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<VendorProfileView>, AppError> {
    let details = app_state
        .vendor_repo
        .find_by_user_id(user.id)
        .await?
        .ok_or(AppError::NotFound("Loja do vendor"))?;
    let verification = app_state.user_repo.get_verification(user.id).await?;

    Ok(Json(VendorProfileView {
        details,
        is_verified: verification.as_ref().map(|v| v.is_verified).unwrap_or(false),
        verified_at: verification.and_then(|v| v.verified_at),
    }))
}

#[utoipa::path(
    get,
    path = "/api/vendor/manpower",
    tag = "Vendor",
    responses((status = 200, description = "Instaladores da loja", body = Vec<Manpower>)),
    security(("api_jwt" = []))
)]
pub async fn list_manpower(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
) -> Result<Json<Vec<Manpower>>, AppError> {
    let details = app_state
        .vendor_repo
        .find_by_user_id(user.id)
        .await?
        .ok_or(AppError::NotFound("Loja do vendor"))?;
    let manpower = app_state.vendor_repo.list_manpower(details.id, false).await?;
    Ok(Json(manpower))
}

#[utoipa::path(
    post,
    path = "/api/vendor/manpower",
    tag = "Vendor",
    request_body = CreateManpowerPayload,
    responses((status = 201, description = "Instalador cadastrado", body = Manpower)),
    security(("api_jwt" = []))
)]
pub async fn create_manpower(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
    Json(payload): Json<CreateManpowerPayload>,
) -> Result<(axum::http::StatusCode, Json<Manpower>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let details = app_state
        .vendor_repo
        .find_by_user_id(user.id)
        .await?
        .ok_or(AppError::NotFound("Loja do vendor"))?;
    let manpower = app_state.vendor_repo.create_manpower(details.id, &payload).await?;

    tracing::info!("👷 Instalador {} cadastrado na loja {}", manpower.name, details.store_name);
    Ok((axum::http::StatusCode::CREATED, Json(manpower)))
}

#[utoipa::path(
    put,
    path = "/api/vendor/manpower/{id}",
    tag = "Vendor",
    request_body = UpdateManpowerPayload,
    params(("id" = Uuid, Path, description = "ID do instalador")),
    responses(
        (status = 200, description = "Instalador atualizado", body = Manpower),
        (status = 404, description = "Instalador não encontrado nesta loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_manpower(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateManpowerPayload>,
) -> Result<Json<Manpower>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let details = app_state
        .vendor_repo
        .find_by_user_id(user.id)
        .await?
        .ok_or(AppError::NotFound("Loja do vendor"))?;
    let manpower = app_state
        .vendor_repo
        .update_manpower(id, details.id, &payload)
        .await?
        .ok_or(AppError::NotFound("Instalador"))?;
    Ok(Json(manpower))
}

// Remoção lógica: as garantias antigas continuam referenciando o registro.
#[utoipa::path(
    delete,
    path = "/api/vendor/manpower/{id}",
    tag = "Vendor",
    params(("id" = Uuid, Path, description = "ID do instalador")),
    responses(
        (status = 200, description = "Instalador desativado"),
        (status = 404, description = "Instalador não encontrado nesta loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_manpower(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let details = app_state
        .vendor_repo
        .find_by_user_id(user.id)
        .await?
        .ok_or(AppError::NotFound("Loja do vendor"))?;
    let affected = app_state.vendor_repo.deactivate_manpower(id, details.id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("Instalador"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

// ---
// Moderação de garantias na fila da loja
// ---

#[utoipa::path(
    post,
    path = "/api/vendor/warranties/{uid}/approve",
    tag = "Vendor",
    params(("uid" = String, Path, description = "UID da garantia")),
    responses(
        (status = 200, description = "Garantia aprovada", body = WarrantyRegistration),
        (status = 400, description = "Garantia fora da fila da loja"),
        (status = 403, description = "Garantia de outra loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_warranty(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
    Path(uid): Path<String>,
) -> Result<Json<WarrantyRegistration>, AppError> {
    let updated = app_state
        .warranty_service
        .vendor_decide(&uid, user.id, true, None)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/api/vendor/warranties/{uid}/reject",
    tag = "Vendor",
    params(("uid" = String, Path, description = "UID da garantia")),
    request_body = RejectWarrantyPayload,
    responses(
        (status = 200, description = "Garantia rejeitada", body = WarrantyRegistration),
        (status = 400, description = "Garantia fora da fila da loja ou motivo ausente"),
        (status = 403, description = "Garantia de outra loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_warranty(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<VendorOnly>,
    Path(uid): Path<String>,
    Json(payload): Json<RejectWarrantyPayload>,
) -> Result<Json<WarrantyRegistration>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let updated = app_state
        .warranty_service
        .vendor_decide(&uid, user.id, false, Some(payload.reason.trim()))
        .await?;
    Ok(Json(updated))
}
