// src/db/user_repo.rs

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        admin::AdminListRow,
        auth::{OtpCode, Profile, Role},
        vendor::VendorVerification,
    },
};

// O repositório de usuários: tabelas 'profiles', 'user_roles',
// 'vendor_verification' e 'otp_codes'.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um perfil pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    // Cria um novo perfil. Roda dentro da transação de registro.
    pub async fn create_profile(
        &self,
        conn: &mut PgConnection,
        name: &str,
        email: &str,
        phone_number: &str,
        password_hash: &str,
    ) -> Result<Profile, AppError> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (name, email, phone_number, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(phone_number)
        .bind(password_hash)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            // Converte violação de chave única em um erro amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn insert_role(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        role: Role,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user_id)
            .bind(role)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn get_role(&self, user_id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    /// IDs de todos os usuários com um determinado papel (alvo de broadcasts).
    pub async fn list_ids_by_role(&self, role: Role) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT user_id FROM user_roles WHERE role = $1",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminListRow>, AppError> {
        let admins = sqlx::query_as::<_, AdminListRow>(
            r#"
            SELECT p.id, p.name, p.email, p.phone_number, p.created_at
            FROM profiles p
            JOIN user_roles ur ON ur.user_id = p.id
            WHERE ur.role = 'admin'
            ORDER BY p.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(admins)
    }

    // ---
    // Verificação de vendor
    // ---

    pub async fn create_verification(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        token: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO vendor_verification (user_id, verification_token) VALUES ($1, $2)",
        )
        .bind(user_id)
        .bind(token)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn get_verification(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VendorVerification>, AppError> {
        let row = sqlx::query_as::<_, VendorVerification>(
            "SELECT * FROM vendor_verification WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_verification_by_token(
        &self,
        token: &str,
    ) -> Result<Option<VendorVerification>, AppError> {
        let row = sqlx::query_as::<_, VendorVerification>(
            "SELECT * FROM vendor_verification WHERE verification_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn set_verified(&self, user_id: Uuid, verified: bool) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE vendor_verification
            SET is_verified = $2, verified_at = CASE WHEN $2 THEN now() ELSE NULL END
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(verified)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // ---
    // OTP de login
    // ---

    pub async fn create_otp(
        &self,
        user_id: Uuid,
        otp_code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO otp_codes (user_id, otp_code, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(otp_code)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Consome o OTP mais recente que ainda é válido. Uso único.
    pub async fn consume_otp(&self, user_id: Uuid, otp: &str) -> Result<bool, AppError> {
        let found = sqlx::query_as::<_, OtpCode>(
            r#"
            SELECT * FROM otp_codes
            WHERE user_id = $1 AND otp_code = $2 AND is_used = FALSE AND expires_at > now()
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(otp)
        .fetch_optional(&self.pool)
        .await?;

        let Some(code) = found else {
            return Ok(false);
        };

        sqlx::query("UPDATE otp_codes SET is_used = TRUE WHERE id = $1")
            .bind(code.id)
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    /// Limpa OTPs expirados com mais de um dia (higiene periódica).
    pub async fn prune_expired_otps(&self) -> Result<u64, AppError> {
        let cutoff = Utc::now() - Duration::days(1);
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_profile(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
