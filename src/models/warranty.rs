// src/models/warranty.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Ciclo de vida: pending -> pending_vendor -> validated | rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "warranty_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WarrantyStatus {
    Pending,
    PendingVendor,
    Validated,
    Rejected,
}

impl WarrantyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarrantyStatus::Pending => "pending",
            WarrantyStatus::PendingVendor => "pending_vendor",
            WarrantyStatus::Validated => "validated",
            WarrantyStatus::Rejected => "rejected",
        }
    }

    /// Transições permitidas do fluxo de moderação.
    pub fn can_transition_to(&self, next: WarrantyStatus) -> bool {
        use WarrantyStatus::*;
        matches!(
            (self, next),
            (Pending, PendingVendor)
                | (Pending, Validated)
                | (Pending, Rejected)
                | (PendingVendor, Validated)
                | (PendingVendor, Rejected)
        )
    }
}

// Registro de garantia como sai do banco.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyRegistration {
    pub id: Uuid,
    pub uid: String,
    pub user_id: Uuid,
    pub product_type: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub car_make: Option<String>,
    pub car_model: Option<String>,
    pub car_year: String,
    pub registration_number: String,
    pub purchase_date: NaiveDate,
    pub installer_name: Option<String>,
    pub installer_contact: Option<String>,
    pub product_details: Option<serde_json::Value>,
    pub manpower_id: Option<Uuid>,
    pub warranty_type: String,
    pub status: WarrantyStatus,
    pub rejection_reason: Option<String>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Linha da listagem administrativa (join com o perfil de quem submeteu).
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyListRow {
    pub id: Uuid,
    pub uid: String,
    pub product_type: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub car_make: Option<String>,
    pub car_model: Option<String>,
    pub registration_number: String,
    pub warranty_type: String,
    pub status: WarrantyStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub submitted_by_name: Option<String>,
    pub submitted_by_email: Option<String>,
    pub manpower_name: Option<String>,
}

pub fn validate_uid_format(uid: &str) -> Result<(), ValidationError> {
    if !is_valid_uid(uid) {
        let mut err = ValidationError::new("uid");
        err.message = Some("O UID deve ser um número de 13 a 16 dígitos.".into());
        return Err(err);
    }
    Ok(())
}

/// O pool externo gera seriais numéricos de 13 a 16 dígitos.
pub fn is_valid_uid(uid: &str) -> bool {
    (13..=16).contains(&uid.len()) && uid.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWarrantyPayload {
    #[validate(custom(function = "validate_uid_format"))]
    pub uid: String,

    #[validate(length(min = 1, message = "O tipo de produto é obrigatório."))]
    pub product_type: String,

    #[validate(length(min = 1, message = "O nome do cliente é obrigatório."))]
    pub customer_name: String,

    #[validate(email(message = "O e-mail do cliente é inválido."))]
    pub customer_email: String,

    #[validate(length(min = 10, message = "O telefone do cliente é obrigatório."))]
    pub customer_phone: String,

    #[validate(length(min = 1, message = "O endereço do cliente é obrigatório."))]
    pub customer_address: String,

    pub car_make: Option<String>,
    pub car_model: Option<String>,

    #[validate(length(equal = 4, message = "O ano do veículo deve ter 4 dígitos."))]
    pub car_year: String,

    #[validate(length(min = 1, message = "A placa do veículo é obrigatória."))]
    pub registration_number: String,

    pub purchase_date: NaiveDate,

    pub installer_name: Option<String>,
    pub installer_contact: Option<String>,

    /// Especificação livre do produto (fotos, nota fiscal, variante...).
    pub product_details: Option<serde_json::Value>,

    /// Instalador da loja, quando a garantia é submetida por uma franquia.
    pub manpower_id: Option<Uuid>,

    #[serde(default = "default_warranty_type")]
    pub warranty_type: String,
}

fn default_warranty_type() -> String {
    "standard".to_string()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWarrantyStatusPayload {
    pub status: WarrantyStatus,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectWarrantyPayload {
    #[validate(length(min = 1, message = "O motivo da rejeição é obrigatório."))]
    pub reason: String,
}

// Filtros da listagem administrativa.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct WarrantyFilterQuery {
    pub status: Option<WarrantyStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// Estatísticas agregadas por cliente (tela de clientes do admin).
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStatsRow {
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub total_warranties: i64,
    pub validated_warranties: i64,
    pub pending_warranties: i64,
    pub rejected_warranties: i64,
    pub first_warranty_date: Option<DateTime<Utc>>,
    pub last_warranty_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_format_accepts_13_to_16_digits() {
        assert!(is_valid_uid("1234567890123"));
        assert!(is_valid_uid("1234567890123456"));
        assert!(!is_valid_uid("123456789012"));
        assert!(!is_valid_uid("12345678901234567"));
        assert!(!is_valid_uid("12345678901a3"));
        assert!(!is_valid_uid(""));
    }

    #[test]
    fn lifecycle_transitions() {
        use WarrantyStatus::*;
        assert!(Pending.can_transition_to(PendingVendor));
        assert!(Pending.can_transition_to(Validated));
        assert!(PendingVendor.can_transition_to(Rejected));
        assert!(!Validated.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Validated));
        assert!(!PendingVendor.can_transition_to(Pending));
    }
}
