// src/handlers/admin.rs
// Dashboard, gestão de vendors, moderação de garantias, clientes e auditoria.
// Tudo aqui passa pelo guard de admin.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bcrypt::hash;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        csv,
        error::AppError,
        pagination::{PageInfo, PaginationQuery},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::{
        admin::{AdminListRow, CreateAdminPayload, DashboardStats, VendorFilterQuery},
        auth::{Profile, Role},
        grievance::GrievanceStatus,
        notification::{NotificationType, NotifyInput},
        vendor::{VendorAdminView, VendorVerificationPayload},
        warranty::{
            CustomerStatsRow, UpdateWarrantyStatusPayload, WarrantyFilterQuery,
            WarrantyRegistration, WarrantyStatus,
        },
    },
    services::messaging,
};

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    responses((status = 200, description = "Números do dashboard", body = DashboardStats)),
    security(("api_jwt" = []))
)]
pub async fn stats(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
) -> Result<Json<DashboardStats>, AppError> {
    let total_warranties = app_state.warranty_repo.count_all().await?;
    let pending_warranties =
        app_state.warranty_repo.count_by_status(WarrantyStatus::Pending).await?;
    let pending_vendor_warranties =
        app_state.warranty_repo.count_by_status(WarrantyStatus::PendingVendor).await?;
    let validated_warranties =
        app_state.warranty_repo.count_by_status(WarrantyStatus::Validated).await?;
    let rejected_warranties =
        app_state.warranty_repo.count_by_status(WarrantyStatus::Rejected).await?;

    let (total_vendors, verified_vendors) = app_state.vendor_repo.vendor_counts().await?;
    let total_customers = app_state.warranty_repo.count_customers().await?;

    let open_grievances = app_state
        .grievance_repo
        .count_by_status(GrievanceStatus::Open)
        .await?
        + app_state
            .grievance_repo
            .count_by_status(GrievanceStatus::InProgress)
            .await?;
    let open_posm_requests = app_state.posm_repo.count_open().await?;

    Ok(Json(DashboardStats {
        total_warranties,
        pending_warranties,
        pending_vendor_warranties,
        validated_warranties,
        rejected_warranties,
        total_vendors,
        verified_vendors,
        total_customers,
        open_grievances,
        open_posm_requests,
    }))
}

// ---
// Vendors
// ---

#[utoipa::path(
    get,
    path = "/api/admin/vendors",
    tag = "Admin",
    params(VendorFilterQuery),
    responses((status = 200, description = "Lojas cadastradas")),
    security(("api_jwt" = []))
)]
pub async fn list_vendors(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Query(filter): Query<VendorFilterQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (rows, total) = app_state.vendor_repo.list_vendors(&filter).await?;
    let page = PaginationQuery { page: filter.page, limit: filter.limit };
    Ok(Json(serde_json::json!({
        "success": true,
        "data": rows,
        "pagination": PageInfo::new(&page, total),
    })))
}

#[utoipa::path(
    get,
    path = "/api/admin/vendors/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID da loja")),
    responses(
        (status = 200, description = "Loja, equipe e contadores", body = VendorAdminView),
        (status = 404, description = "Loja não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vendor(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorAdminView>, AppError> {
    let vendor = app_state
        .vendor_repo
        .get_vendor_row(id)
        .await?
        .ok_or(AppError::NotFound("Loja"))?;

    let manpower = app_state.vendor_repo.list_manpower(id, false).await?;
    let total_warranties = app_state
        .warranty_repo
        .count_for_vendor(vendor.user_id, id, None)
        .await?;
    let pending_warranties = app_state
        .warranty_repo
        .count_for_vendor(vendor.user_id, id, Some(WarrantyStatus::Pending))
        .await?
        + app_state
            .warranty_repo
            .count_for_vendor(vendor.user_id, id, Some(WarrantyStatus::PendingVendor))
            .await?;

    Ok(Json(VendorAdminView { vendor, manpower, total_warranties, pending_warranties }))
}

#[utoipa::path(
    put,
    path = "/api/admin/vendors/{id}/verification",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID da loja")),
    request_body = VendorVerificationPayload,
    responses((status = 200, description = "Verificação atualizada")),
    security(("api_jwt" = []))
)]
pub async fn set_vendor_verification(
    State(app_state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VendorVerificationPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let vendor = app_state
        .vendor_repo
        .get_vendor_row(id)
        .await?
        .ok_or(AppError::NotFound("Loja"))?;

    let affected = app_state
        .user_repo
        .set_verified(vendor.user_id, payload.is_verified)
        .await?;
    if affected == 0 {
        return Err(AppError::NotFound("Registro de verificação"));
    }

    tracing::info!(
        "🏪 Loja {} marcada como {} por {}",
        vendor.store_name,
        if payload.is_verified { "verificada" } else { "não verificada" },
        admin.name
    );

    if payload.is_verified {
        let (subject, html) =
            messaging::vendor_verified_email(&vendor.name, &vendor.store_name);
        if let Err(e) = app_state
            .mailer
            .send(&vendor.email, &subject, html, "vendor_verified", Some(vendor.user_id.to_string()))
            .await
        {
            tracing::warn!("⚠️ E-mail de verificação não enviado: {:?}", e);
        }

        let input = NotifyInput::new(
            NotificationType::System,
            "Loja verificada",
            format!("{} foi aprovada e já pode operar no portal.", vendor.store_name),
        );
        if let Err(e) = app_state.notification_service.notify(vendor.user_id, input).await {
            tracing::warn!("⚠️ Falha ao notificar vendor verificado: {:?}", e);
        }
    }

    if let Err(e) = app_state
        .activity_repo
        .record(
            Some(admin.id),
            "vendor_verification_updated",
            Some("vendor"),
            Some(&id.to_string()),
            Some(serde_json::json!({ "isVerified": payload.is_verified })),
        )
        .await
    {
        tracing::warn!("⚠️ Falha ao gravar activity_log: {:?}", e);
    }

    Ok(Json(serde_json::json!({ "success": true, "isVerified": payload.is_verified })))
}

#[utoipa::path(
    delete,
    path = "/api/admin/vendors/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID da loja")),
    responses((status = 200, description = "Loja e perfil removidos")),
    security(("api_jwt" = []))
)]
pub async fn delete_vendor(
    State(app_state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = app_state
        .vendor_repo
        .delete_vendor(id)
        .await?
        .ok_or(AppError::NotFound("Loja"))?;
    app_state.user_repo.delete_profile(user_id).await?;

    tracing::info!("🗑️ Loja {} removida por {}", id, admin.name);

    if let Err(e) = app_state
        .activity_repo
        .record(Some(admin.id), "vendor_deleted", Some("vendor"), Some(&id.to_string()), None)
        .await
    {
        tracing::warn!("⚠️ Falha ao gravar activity_log: {:?}", e);
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

// ---
// Garantias
// ---

#[utoipa::path(
    get,
    path = "/api/admin/warranties",
    tag = "Admin",
    params(WarrantyFilterQuery),
    responses((status = 200, description = "Garantias filtradas")),
    security(("api_jwt" = []))
)]
pub async fn list_warranties(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Query(filter): Query<WarrantyFilterQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (rows, total) = app_state.warranty_repo.list_all(&filter).await?;
    let page = PaginationQuery { page: filter.page, limit: filter.limit };
    Ok(Json(serde_json::json!({
        "success": true,
        "data": rows,
        "pagination": PageInfo::new(&page, total),
    })))
}

#[utoipa::path(
    put,
    path = "/api/admin/warranties/{uid}/status",
    tag = "Admin",
    params(("uid" = String, Path, description = "UID da garantia")),
    request_body = UpdateWarrantyStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = WarrantyRegistration),
        (status = 400, description = "Transição não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_warranty_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(uid): Path<String>,
    Json(payload): Json<UpdateWarrantyStatusPayload>,
) -> Result<Json<WarrantyRegistration>, AppError> {
    let updated = app_state
        .warranty_service
        .update_status(&uid, payload.status, payload.rejection_reason.as_deref())
        .await?;

    if let Err(e) = app_state
        .activity_repo
        .record(
            Some(admin.id),
            "warranty_status_updated",
            Some("warranty"),
            Some(&uid),
            Some(serde_json::json!({ "status": payload.status })),
        )
        .await
    {
        tracing::warn!("⚠️ Falha ao gravar activity_log: {:?}", e);
    }

    Ok(Json(updated))
}

// Export CSV com o mesmo filtro da listagem.
#[utoipa::path(
    get,
    path = "/api/admin/warranties/export",
    tag = "Admin",
    params(WarrantyFilterQuery),
    responses((status = 200, description = "CSV das garantias", content_type = "text/csv")),
    security(("api_jwt" = []))
)]
pub async fn export_warranties(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Query(filter): Query<WarrantyFilterQuery>,
) -> Result<axum::response::Response, AppError> {
    let rows = app_state.warranty_repo.list_all_for_export(&filter).await?;

    let mut body = String::new();
    csv::push_row(
        &mut body,
        &[
            "uid", "status", "customer_name", "customer_email", "customer_phone",
            "product_type", "car_make", "car_model", "registration_number",
            "warranty_type", "submitted_by", "manpower", "created_at",
        ],
    );
    for row in &rows {
        csv::push_row(
            &mut body,
            &[
                &row.uid,
                row.status.as_str(),
                &row.customer_name,
                &row.customer_email,
                &row.customer_phone,
                &row.product_type,
                row.car_make.as_deref().unwrap_or(""),
                row.car_model.as_deref().unwrap_or(""),
                &row.registration_number,
                &row.warranty_type,
                row.submitted_by_name.as_deref().unwrap_or(""),
                row.manpower_name.as_deref().unwrap_or(""),
                &row.created_at.to_rfc3339(),
            ],
        );
    }

    let response = axum::response::Response::builder()
        .header("Content-Type", "text/csv; charset=utf-8")
        .header("Content-Disposition", "attachment; filename=\"warranties.csv\"")
        .body(axum::body::Body::from(body))
        .map_err(|e| anyhow::anyhow!("Falha ao montar resposta CSV: {}", e))?;
    Ok(response)
}

// ---
// Clientes (agrupados por e-mail das garantias)
// ---

#[utoipa::path(
    get,
    path = "/api/admin/customers",
    tag = "Admin",
    responses((status = 200, description = "Clientes com estatísticas", body = Vec<CustomerStatsRow>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
) -> Result<Json<Vec<CustomerStatsRow>>, AppError> {
    let rows = app_state.warranty_repo.customers_with_stats().await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/admin/customers/{email}",
    tag = "Admin",
    params(("email" = String, Path, description = "E-mail do cliente")),
    responses((status = 200, description = "Garantias do cliente", body = Vec<WarrantyRegistration>)),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(email): Path<String>,
) -> Result<Json<Vec<WarrantyRegistration>>, AppError> {
    let rows = app_state.warranty_repo.list_by_customer_email(&email).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound("Cliente"));
    }
    Ok(Json(rows))
}

#[utoipa::path(
    delete,
    path = "/api/admin/customers/{email}",
    tag = "Admin",
    params(("email" = String, Path, description = "E-mail do cliente")),
    responses((status = 200, description = "Garantias do cliente removidas")),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(email): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = app_state.warranty_repo.delete_by_customer_email(&email).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Cliente"));
    }

    tracing::info!("🗑️ {} garantias do cliente {} removidas por {}", deleted, email, admin.name);

    if let Err(e) = app_state
        .activity_repo
        .record(
            Some(admin.id),
            "customer_deleted",
            Some("customer"),
            Some(&email),
            Some(serde_json::json!({ "deletedWarranties": deleted })),
        )
        .await
    {
        tracing::warn!("⚠️ Falha ao gravar activity_log: {:?}", e);
    }

    Ok(Json(serde_json::json!({ "success": true, "deleted": deleted })))
}

// ---
// Contas de admin
// ---

#[utoipa::path(
    get,
    path = "/api/admin/admins",
    tag = "Admin",
    responses((status = 200, description = "Admins cadastrados", body = Vec<AdminListRow>)),
    security(("api_jwt" = []))
)]
pub async fn list_admins(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
) -> Result<Json<Vec<AdminListRow>>, AppError> {
    let rows = app_state.user_repo.list_admins().await?;
    Ok(Json(rows))
}

// Admins não passam pelo registro público: só outro admin cria.
#[utoipa::path(
    post,
    path = "/api/admin/admins",
    tag = "Admin",
    request_body = CreateAdminPayload,
    responses(
        (status = 201, description = "Admin criado", body = Profile),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_admin(
    State(app_state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateAdminPayload>,
) -> Result<(axum::http::StatusCode, Json<Profile>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let password = payload.password.clone();
    let password_hash =
        tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

    let mut tx = app_state.db_pool.begin().await?;
    let profile = app_state
        .user_repo
        .create_profile(
            &mut *tx,
            payload.name.trim(),
            &payload.email.to_lowercase(),
            &payload.phone_number,
            &password_hash,
        )
        .await?;
    app_state.user_repo.insert_role(&mut *tx, profile.id, Role::Admin).await?;
    tx.commit().await?;

    tracing::info!("👤 Admin {} criado por {}", profile.email, admin.name);

    if let Err(e) = app_state
        .activity_repo
        .record(
            Some(admin.id),
            "admin_created",
            Some("profile"),
            Some(&profile.id.to_string()),
            None,
        )
        .await
    {
        tracing::warn!("⚠️ Falha ao gravar activity_log: {:?}", e);
    }

    Ok((axum::http::StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    get,
    path = "/api/admin/activity-logs",
    tag = "Admin",
    params(PaginationQuery),
    responses((status = 200, description = "Trilha de auditoria")),
    security(("api_jwt" = []))
)]
pub async fn activity_logs(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (rows, total) = app_state.activity_repo.list(&page).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": rows,
        "pagination": PageInfo::new(&page, total),
    })))
}
