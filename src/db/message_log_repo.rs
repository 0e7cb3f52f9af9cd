// src/db/message_log_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::messaging::MessageLogEntry};

// Auditoria de e-mails e mensagens de WhatsApp. Só escrita; a leitura é
// feita direto no banco pela operação.
#[derive(Clone)]
pub struct MessageLogRepository {
    pool: PgPool,
}

impl MessageLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry: &MessageLogEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO message_logs
                (recipient, channel, template_name, status, context, reference_id, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&entry.recipient)
        .bind(entry.channel)
        .bind(&entry.template_name)
        .bind(entry.status)
        .bind(&entry.context)
        .bind(&entry.reference_id)
        .bind(&entry.error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
