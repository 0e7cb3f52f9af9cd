// src/models/grievance.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "grievance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GrievanceStatus {
    Open,
    InProgress,
    Resolved,
    Rejected,
}

impl GrievanceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GrievanceStatus::Resolved | GrievanceStatus::Rejected)
    }
}

// Quem abriu a reclamação: cliente final ou a própria franquia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "grievance_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GrievanceSource {
    Customer,
    Franchise,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Grievance {
    pub id: Uuid,
    pub ticket_id: String,
    pub customer_id: Uuid,
    pub franchise_id: Option<Uuid>,
    pub source_type: GrievanceSource,
    pub department: Option<String>,
    pub department_details: Option<String>,
    pub category: String,
    pub subject: String,
    pub description: String,
    pub attachments: Option<serde_json::Value>,
    pub status: GrievanceStatus,
    pub priority: Option<String>,
    pub rating: Option<i32>,
    pub admin_notes: Option<String>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Listagem com o nome do cliente/loja resolvidos.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrievanceListRow {
    pub id: Uuid,
    pub ticket_id: String,
    pub source_type: GrievanceSource,
    pub category: String,
    pub subject: String,
    pub status: GrievanceStatus,
    pub priority: Option<String>,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub franchise_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    FollowUpSent,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "assignment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    Initial,
    FollowUp,
}

// Histórico append-only de atribuições a responsáveis externos.
// A linha mais recente por (grievance, assignee) é a autoritativa.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrievanceAssignment {
    pub id: i64,
    pub grievance_id: Uuid,
    pub assignee_name: String,
    pub assignee_email: String,
    pub remarks: Option<String>,
    pub assignment_type: AssignmentType,
    pub status: AssignmentStatus,
    pub estimated_completion_date: NaiveDate,
    #[serde(skip_serializing)]
    pub update_token: String,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub last_follow_up_at: Option<DateTime<Utc>>,
    pub sent_by: Option<Uuid>,
    pub sent_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Contexto que o portal público do responsável enxerga.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPortalView {
    pub ticket_id: String,
    pub category: String,
    pub subject: String,
    pub description: String,
    pub customer_name: Option<String>,
    pub franchise_name: Option<String>,
    pub assignee_name: String,
    pub status: AssignmentStatus,
    pub estimated_completion_date: NaiveDate,
    pub assigned_at: DateTime<Utc>,
}

// Linha que o scheduler de follow-up processa: a última atribuição pendente
// de cada (reclamação, responsável), com o contexto para o e-mail.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OverdueAssignment {
    pub id: i64,
    pub grievance_id: Uuid,
    pub assignee_name: String,
    pub assignee_email: String,
    pub estimated_completion_date: NaiveDate,
    pub update_token: String,
    pub ticket_id: String,
    pub category: String,
    pub subject: String,
    pub description: String,
    pub customer_name: Option<String>,
    pub franchise_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrievanceRemark {
    pub id: i64,
    pub grievance_id: Uuid,
    pub author_id: Option<Uuid>,
    pub author_role: Option<Role>,
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGrievancePayload {
    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub category: String,

    #[validate(length(min = 1, message = "O assunto é obrigatório."))]
    pub subject: String,

    #[validate(length(min = 10, message = "Descreva o problema com pelo menos 10 caracteres."))]
    pub description: String,

    /// Loja reclamada, quando aplicável.
    pub franchise_id: Option<Uuid>,

    /// URLs já enviadas via /api/upload (máx. 3).
    #[validate(length(max = 3, message = "Máximo de 3 anexos."))]
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFranchiseGrievancePayload {
    #[validate(length(min = 1, message = "O departamento é obrigatório."))]
    pub department: String,

    pub department_details: Option<String>,

    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub category: String,

    #[validate(length(min = 1, message = "O assunto é obrigatório."))]
    pub subject: String,

    #[validate(length(min = 10, message = "Descreva o problema com pelo menos 10 caracteres."))]
    pub description: String,

    #[validate(length(max = 3, message = "Máximo de 3 anexos."))]
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGrievanceStatusPayload {
    pub status: Option<GrievanceStatus>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateGrievancePayload {
    pub category: Option<String>,
    pub priority: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddRemarkPayload {
    #[validate(length(min = 1, message = "O comentário não pode ser vazio."))]
    pub remark: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingPayload {
    #[validate(range(min = 1, max = 5, message = "A avaliação deve ser entre 1 e 5."))]
    pub rating: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendAssignmentPayload {
    #[validate(length(min = 1, message = "O nome do responsável é obrigatório."))]
    pub assignee_name: String,

    #[validate(email(message = "O e-mail do responsável é inválido."))]
    pub assignee_email: String,

    pub remarks: Option<String>,

    pub estimated_completion_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentUpdatePayload {
    #[validate(length(min = 1, message = "O comentário é obrigatório."))]
    pub remarks: String,

    /// true encerra a atribuição e move a reclamação adiante.
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct GrievanceFilterQuery {
    pub status: Option<GrievanceStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
