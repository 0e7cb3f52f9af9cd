// src/models/vendor.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// GET /api/vendor/verify?token=
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct VerifyTokenQuery {
    pub token: String,
}

// Detalhes da loja/franquia vinculada a um perfil de vendor.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub store_name: String,
    pub store_code: Option<String>,
    pub store_email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub contact_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Estado de verificação do vendor (aprovação do admin).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VendorVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub verification_token: String,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

// Instalador (mão de obra) de uma loja.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Manpower {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateManpowerPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManpowerPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

// Linha da listagem administrativa de vendors (join com perfil).
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorListRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub store_name: String,
    pub store_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

// Visão pública de loja para o formulário de registro de garantia.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicStore {
    pub id: Uuid,
    pub store_name: String,
    pub store_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorVerificationPayload {
    pub is_verified: bool,
}

// Resposta do GET /api/vendor/profile.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorProfileView {
    pub details: VendorDetails,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

// Detalhe administrativo: loja + equipe + contadores de garantia.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorAdminView {
    pub vendor: VendorListRow,
    pub manpower: Vec<Manpower>,
    pub total_warranties: i64,
    pub pending_warranties: i64,
}
