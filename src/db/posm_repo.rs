// src/db/posm_repo.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PaginationQuery},
    models::posm::{
        PosmMessage, PosmRequest, PosmRequestListRow, PosmSenderRole, PosmStatus,
        SubmitPosmPayload, UpdatePosmPayload,
    },
};

#[derive(Clone)]
pub struct PosmRepository {
    pool: PgPool,
}

impl PosmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Ticket e primeira mensagem entram na mesma transação.
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        ticket_id: &str,
        franchise_id: Uuid,
        payload: &SubmitPosmPayload,
    ) -> Result<PosmRequest, AppError> {
        let row = sqlx::query_as::<_, PosmRequest>(
            r#"
            INSERT INTO posm_requests (ticket_id, franchise_id, requirement)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(franchise_id)
        .bind(&payload.requirement)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<PosmRequest>, AppError> {
        let row = sqlx::query_as::<_, PosmRequest>("SELECT * FROM posm_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn store_name(&self, franchise_id: Uuid) -> Result<Option<String>, AppError> {
        let name = sqlx::query_scalar::<_, String>(
            "SELECT store_name FROM vendor_details WHERE id = $1",
        )
        .bind(franchise_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(name)
    }

    pub async fn list_for_franchise(
        &self,
        franchise_id: Uuid,
    ) -> Result<Vec<PosmRequest>, AppError> {
        let rows = sqlx::query_as::<_, PosmRequest>(
            "SELECT * FROM posm_requests WHERE franchise_id = $1 ORDER BY updated_at DESC",
        )
        .bind(franchise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(
        &self,
        status: Option<PosmStatus>,
        page: &PaginationQuery,
    ) -> Result<(Vec<PosmRequestListRow>, i64), AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posm_requests WHERE ($1::posm_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, PosmRequestListRow>(
            r#"
            SELECT pr.id, pr.ticket_id, pr.franchise_id, vd.store_name,
                   pr.requirement, pr.status, pr.created_at, pr.updated_at
            FROM posm_requests pr
            JOIN vendor_details vd ON vd.id = pr.franchise_id
            WHERE ($1::posm_status IS NULL OR pr.status = $1)
            ORDER BY pr.updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn count_open(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posm_requests WHERE status IN ('open', 'in_progress')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn update(
        &self,
        id: i64,
        payload: &UpdatePosmPayload,
    ) -> Result<Option<PosmRequest>, AppError> {
        let row = sqlx::query_as::<_, PosmRequest>(
            r#"
            UPDATE posm_requests
            SET status = $2,
                internal_notes = COALESCE($3, internal_notes),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.status)
        .bind(&payload.internal_notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // ---
    // Chat do ticket
    // ---

    pub async fn add_message(
        &self,
        conn: &mut PgConnection,
        request_id: i64,
        sender_id: Uuid,
        sender_role: PosmSenderRole,
        message: Option<&str>,
        attachments: &[String],
    ) -> Result<PosmMessage, AppError> {
        let attachments = serde_json::to_value(attachments)?;
        let row = sqlx::query_as::<_, PosmMessage>(
            r#"
            INSERT INTO posm_messages (request_id, sender_id, sender_role, message, attachments)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(sender_id)
        .bind(sender_role)
        .bind(message)
        .bind(attachments)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn list_messages(&self, request_id: i64) -> Result<Vec<PosmMessage>, AppError> {
        let rows = sqlx::query_as::<_, PosmMessage>(
            "SELECT * FROM posm_messages WHERE request_id = $1 ORDER BY created_at ASC",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Nova mensagem reaparece no topo da fila da outra ponta.
    pub async fn touch(&self, conn: &mut PgConnection, request_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE posm_requests SET updated_at = now() WHERE id = $1")
            .bind(request_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
