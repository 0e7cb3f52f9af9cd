// src/models/posm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "posm_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PosmStatus {
    Open,
    InProgress,
    Dispatched,
    Closed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "posm_sender_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PosmSenderRole {
    Franchise,
    Admin,
}

// Ticket de material de ponto de venda aberto por uma franquia.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosmRequest {
    pub id: i64,
    pub ticket_id: String,
    pub franchise_id: Uuid,
    pub requirement: String,
    pub status: PosmStatus,
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Listagem administrativa com o nome da loja resolvido.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosmRequestListRow {
    pub id: i64,
    pub ticket_id: String,
    pub franchise_id: Uuid,
    pub store_name: String,
    pub requirement: String,
    pub status: PosmStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosmMessage {
    pub id: i64,
    pub request_id: i64,
    pub sender_id: Uuid,
    pub sender_role: PosmSenderRole,
    pub message: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosmTicketView {
    #[serde(flatten)]
    pub request: PosmRequest,
    pub store_name: String,
    pub messages: Vec<PosmMessage>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPosmPayload {
    #[validate(length(min = 1, message = "A descrição do requisito é obrigatória."))]
    pub requirement: String,

    /// URLs já enviadas via /api/upload (máx. 5).
    #[validate(length(max = 5, message = "Máximo de 5 anexos."))]
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosmMessagePayload {
    pub message: Option<String>,

    #[validate(length(max = 5, message = "Máximo de 5 anexos."))]
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePosmPayload {
    pub status: PosmStatus,
    pub internal_notes: Option<String>,
}
