// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Papel do usuário dentro do portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendor,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Vendor => "vendor",
            Role::Customer => "customer",
        }
    }
}

// Representa um perfil vindo do banco de dados.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Visão do usuário autenticado que circula nos handlers e no /me.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: Role,
    pub is_validated: bool,
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(10..=15).contains(&digits) {
        let mut err = ValidationError::new("phone");
        err.message = Some("O telefone deve ter entre 10 e 15 dígitos.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_public_role(role: &Role) -> Result<(), ValidationError> {
    // Contas admin só nascem pelo endpoint administrativo.
    if *role == Role::Admin {
        let mut err = ValidationError::new("role");
        err.message = Some("Não é possível registrar uma conta admin.".into());
        return Err(err);
    }
    Ok(())
}

// Dados para registro de um novo usuário.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone_number: String,

    #[validate(custom(function = "validate_public_role"))]
    pub role: Role,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,

    /// Nome da loja, obrigatório apenas para registros de vendor.
    pub store_name: Option<String>,
    pub store_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

// Dados para o primeiro passo do login (senha).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Segundo passo: confirmação do OTP enviado por e-mail.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpPayload {
    pub user_id: Uuid,
    #[validate(length(equal = 6, message = "O OTP deve ter 6 dígitos."))]
    pub otp: String,
}

// Resposta do login: o token só sai depois do OTP.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
    pub requires_otp: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
}

// Estrutura de dados ("claims") dentro do JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // Subject (ID do usuário)
    pub email: String,
    pub role: Role,
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued At
}

// Registro de OTP pendente no banco.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub otp_code: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_validation_counts_digits_only() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 98765 43210").is_ok());
        assert!(validate_phone("12345").is_err());
    }

    #[test]
    fn admin_cannot_self_register() {
        let payload = RegisterPayload {
            name: "Admin".into(),
            email: "admin@example.com".into(),
            phone_number: "9876543210".into(),
            role: Role::Admin,
            password: "secret123".into(),
            store_name: None,
            store_code: None,
            city: None,
            state: None,
        };
        assert!(payload.validate().is_err());
    }
}
