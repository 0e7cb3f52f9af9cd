// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{UserRepository, VendorRepository},
    models::{
        auth::{AuthUser, Claims, Profile, RegisterPayload, Role},
        vendor::VendorVerification,
    },
    services::messaging::{self, Mailer},
};

// O OTP expira em 10 minutos; o JWT vale 7 dias.
const OTP_TTL_MINUTES: i64 = 10;
const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    vendor_repo: VendorRepository,
    mailer: Mailer,
    jwt_secret: String,
    app_url: String,
    admin_email: Option<String>,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        vendor_repo: VendorRepository,
        mailer: Mailer,
        jwt_secret: String,
        app_url: String,
        admin_email: Option<String>,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, vendor_repo, mailer, jwt_secret, app_url, admin_email, pool }
    }

    /// Registro público (customer ou vendor). Perfil, papel e, no caso de
    /// vendor, loja e verificação nascem na mesma transação.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<Profile, AppError> {
        if payload.role == Role::Vendor
            && payload.store_name.as_deref().unwrap_or("").trim().is_empty()
        {
            return Err(AppError::BadRequest(
                "O nome da loja é obrigatório para cadastro de vendor.".to_string(),
            ));
        }

        // O hashing fica fora da transação, em uma thread de bloqueio.
        let password = payload.password.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let mut tx = self.pool.begin().await?;

        let profile = self
            .user_repo
            .create_profile(
                &mut *tx,
                payload.name.trim(),
                &payload.email.to_lowercase(),
                &payload.phone_number,
                &password_hash,
            )
            .await?;

        self.user_repo.insert_role(&mut *tx, profile.id, payload.role).await?;

        let mut verification_token = None;
        if payload.role == Role::Vendor {
            self.vendor_repo
                .create_details(
                    &mut *tx,
                    profile.id,
                    payload.store_name.as_deref().unwrap_or("").trim(),
                    payload.store_code.as_deref(),
                    payload.city.as_deref(),
                    payload.state.as_deref(),
                )
                .await?;
            let token = random_token(48);
            self.user_repo.create_verification(&mut *tx, profile.id, &token).await?;
            verification_token = Some(token);
        }

        tx.commit().await?;

        tracing::info!("🆕 Usuário {} registrado como {}", profile.email, payload.role.as_str());

        if let Some(token) = verification_token {
            let store_name = payload.store_name.as_deref().unwrap_or("");

            let (subject, html) = messaging::vendor_welcome_email(&profile.name, store_name);
            if let Err(e) = self
                .mailer
                .send(&profile.email, &subject, html, "vendor_welcome", Some(profile.id.to_string()))
                .await
            {
                tracing::warn!("⚠️ E-mail de boas-vindas não enviado: {:?}", e);
            }

            // O link de aprovação vai para o admin, não para o vendor.
            if let Some(admin_email) = &self.admin_email {
                let verify_link =
                    format!("{}/api/vendor/verify?token={}", self.app_url, token);
                let (subject, html) = messaging::vendor_verification_request_email(
                    store_name,
                    &profile.name,
                    &profile.email,
                    &verify_link,
                );
                if let Err(e) = self
                    .mailer
                    .send(
                        admin_email,
                        &subject,
                        html,
                        "vendor_verification_request",
                        Some(profile.id.to_string()),
                    )
                    .await
                {
                    tracing::warn!("⚠️ Aviso de novo vendor não enviado ao admin: {:?}", e);
                }
            }
        }

        Ok(profile)
    }

    /// Primeiro passo do login: confere a senha e dispara o OTP por e-mail.
    /// O token só sai no segundo passo.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, AppError> {
        let profile = self
            .user_repo
            .find_by_email(&email.to_lowercase())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_owned();
        let password_hash = profile.password_hash.clone();
        let is_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Vendors não verificados param aqui, antes de qualquer OTP.
        let role = self
            .user_repo
            .get_role(profile.id)
            .await?
            .ok_or(AppError::NotFound("Papel do usuário"))?;
        let verification = if role == Role::Vendor {
            self.user_repo.get_verification(profile.id).await?
        } else {
            None
        };
        ensure_login_allowed(role, verification.as_ref())?;

        let otp = generate_otp();
        let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);
        self.user_repo.create_otp(profile.id, &otp, expires_at).await?;

        let (subject, html) = messaging::otp_email(&profile.name, &otp);
        self.mailer
            .send(&profile.email, &subject, html, "login_otp", Some(profile.id.to_string()))
            .await?;

        tracing::info!("🔐 OTP de login emitido para {}", profile.email);
        Ok(profile)
    }

    /// Segundo passo: consome o OTP e emite o JWT.
    pub async fn verify_otp(&self, user_id: Uuid, otp: &str) -> Result<(String, AuthUser), AppError> {
        let consumed = self.user_repo.consume_otp(user_id, otp).await?;
        if !consumed {
            return Err(AppError::InvalidOtp);
        }

        let user = self.auth_user(user_id).await?;
        let token = self.create_token(&user)?;
        tracing::info!("✅ Login concluído para {}", user.email);
        Ok((token, user))
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthUser, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.auth_user(token_data.claims.sub).await
    }

    /// Monta a visão autenticada: perfil + papel + estado de verificação.
    pub async fn auth_user(&self, user_id: Uuid) -> Result<AuthUser, AppError> {
        let profile = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;
        let role = self
            .user_repo
            .get_role(user_id)
            .await?
            .ok_or(AppError::NotFound("Papel do usuário"))?;

        // Vendors só operam depois da aprovação do admin.
        let is_validated = match role {
            Role::Vendor => self
                .user_repo
                .get_verification(user_id)
                .await?
                .map(|v| v.is_verified)
                .unwrap_or(false),
            _ => true,
        };

        Ok(AuthUser {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            phone_number: profile.phone_number,
            role,
            is_validated,
        })
    }

    fn create_token(&self, user: &AuthUser) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

/// Porteiro do primeiro passo do login: vendor sem verificação aprovada
/// não recebe OTP.
fn ensure_login_allowed(
    role: Role,
    verification: Option<&VendorVerification>,
) -> Result<(), AppError> {
    if role == Role::Vendor && !verification.map(|v| v.is_verified).unwrap_or(false) {
        return Err(AppError::VendorNotVerified);
    }
    Ok(())
}

/// OTP numérico de 6 dígitos.
pub fn generate_otp() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

/// Token opaco alfanumérico (verificação de vendor, portal de atribuição).
pub fn random_token(len: usize) -> String {
    use rand::distributions::Alphanumeric;
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn random_token_has_requested_length() {
        assert_eq!(random_token(48).len(), 48);
        assert_ne!(random_token(32), random_token(32));
    }

    fn verification(is_verified: bool) -> VendorVerification {
        VendorVerification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            verification_token: "abc".to_string(),
            is_verified,
            verified_at: is_verified.then(Utc::now),
        }
    }

    #[test]
    fn unverified_vendor_cannot_start_login() {
        // Sem registro de verificação ou com registro pendente: 403.
        assert!(matches!(
            ensure_login_allowed(Role::Vendor, None),
            Err(AppError::VendorNotVerified)
        ));
        assert!(matches!(
            ensure_login_allowed(Role::Vendor, Some(&verification(false))),
            Err(AppError::VendorNotVerified)
        ));
    }

    #[test]
    fn verified_vendor_and_other_roles_can_log_in() {
        assert!(ensure_login_allowed(Role::Vendor, Some(&verification(true))).is_ok());
        assert!(ensure_login_allowed(Role::Customer, None).is_ok());
        assert!(ensure_login_allowed(Role::Admin, None).is_ok());
    }
}
