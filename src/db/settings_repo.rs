// src/db/settings_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::settings::SystemSetting};

// Chaves conhecidas pelo portal. Valores fora dessa lista são rejeitados
// na camada de handler.
pub const KNOWN_KEYS: &[&str] = &["support_phone", "support_email", "whatsapp_number"];

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<SystemSetting>, AppError> {
        let row = sqlx::query_as::<_, SystemSetting>(
            "SELECT * FROM system_settings WHERE setting_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<SystemSetting>, AppError> {
        let rows = sqlx::query_as::<_, SystemSetting>(
            "SELECT * FROM system_settings ORDER BY setting_key ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Upsert: a primeira escrita cria a linha, as demais sobrescrevem.
    pub async fn upsert(
        &self,
        key: &str,
        value: &str,
        updated_by: Option<&str>,
    ) -> Result<SystemSetting, AppError> {
        let row = sqlx::query_as::<_, SystemSetting>(
            r#"
            INSERT INTO system_settings (setting_key, setting_value, updated_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (setting_key)
            DO UPDATE SET setting_value = EXCLUDED.setting_value,
                          updated_by = EXCLUDED.updated_by,
                          updated_at = now()
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
