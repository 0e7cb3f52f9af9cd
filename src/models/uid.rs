// src/models/uid.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// Serial pré-gerado pelo sistema externo, aguardando consumo.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreGeneratedUid {
    pub uid: String,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Linha da listagem administrativa (join com a garantia consumidora).
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UidListRow {
    pub uid: String,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub registration_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncUidsPayload {
    pub uids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddUidPayload {
    #[validate(custom(function = "crate::models::warranty::validate_uid_format"))]
    pub uid: String,
}

// Resultado individual da sincronização em lote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Inserted,
    AlreadyExistsAvailable,
    AlreadyExistsUsed,
    InvalidFormat,
    DuplicateInRequest,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncDetail {
    pub uid: String,
    pub status: SyncOutcome,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<serde_json::Value>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct SyncStats {
    pub total_received: usize,
    pub inserted: usize,
    pub already_exists_available: usize,
    pub already_exists_used: usize,
    pub invalid_format: usize,
    pub duplicate_in_request: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub stats: SyncStats,
    pub details: Vec<SyncDetail>,
}

// Resposta do GET /api/uid/validate/{uid}.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateUidResponse {
    pub valid: bool,
    pub available: bool,
    pub message: String,
}

// Contadores do pool para a tela administrativa.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct UidPoolStats {
    pub total: i64,
    pub available: i64,
    pub used: i64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UidFilterQuery {
    /// "available", "used" ou "all"
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
