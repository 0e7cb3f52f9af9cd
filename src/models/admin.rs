// src/models/admin.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Resumo do dashboard administrativo.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_warranties: i64,
    pub pending_warranties: i64,
    pub pending_vendor_warranties: i64,
    pub validated_warranties: i64,
    pub rejected_warranties: i64,
    pub total_vendors: i64,
    pub verified_vendors: i64,
    pub total_customers: i64,
    pub open_grievances: i64,
    pub open_posm_requests: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(length(min = 10, message = "O telefone é obrigatório."))]
    pub phone_number: String,

    #[validate(length(min = 8, message = "A senha de admin deve ter no mínimo 8 caracteres."))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminListRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

// Trilha de auditoria das ações administrativas.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: i64,
    pub admin_id: Option<Uuid>,
    pub action_type: String,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct VendorFilterQuery {
    pub search: Option<String>,
    pub verified: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
