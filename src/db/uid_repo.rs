// src/db/uid_repo.rs

use sqlx::{PgConnection, PgPool};

use crate::{
    common::{error::AppError, pagination::PaginationQuery},
    models::uid::{PreGeneratedUid, UidFilterQuery, UidListRow, UidPoolStats},
};

#[derive(Clone)]
pub struct UidRepository {
    pool: PgPool,
}

impl UidRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, uid: &str) -> Result<Option<PreGeneratedUid>, AppError> {
        let row = sqlx::query_as::<_, PreGeneratedUid>(
            "SELECT * FROM pre_generated_uids WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Estado de um lote de UIDs, com a garantia consumidora quando houver.
    pub async fn find_many_with_usage(
        &self,
        uids: &[String],
    ) -> Result<Vec<UidListRow>, AppError> {
        let rows = sqlx::query_as::<_, UidListRow>(
            r#"
            SELECT p.uid, p.is_used, p.used_at, p.created_at,
                   w.customer_name, w.registration_number
            FROM pre_generated_uids p
            LEFT JOIN warranty_registrations w ON w.uid = p.uid
            WHERE p.uid = ANY($1)
            "#,
        )
        .bind(uids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Lote novo inteiro em uma transação: ou entra tudo, ou nada.
    pub async fn insert_batch(
        &self,
        conn: &mut PgConnection,
        uids: &[String],
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "INSERT INTO pre_generated_uids (uid) SELECT unnest($1::text[])",
        )
        .bind(uids)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_one(&self, uid: &str) -> Result<PreGeneratedUid, AppError> {
        sqlx::query_as::<_, PreGeneratedUid>(
            "INSERT INTO pre_generated_uids (uid) VALUES ($1) RETURNING *",
        )
        .bind(uid)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("O UID {uid} já existe no sistema."));
                }
            }
            e.into()
        })
    }

    /// Marca o UID como consumido. Retorna false se ele não existe ou já foi
    /// usado. O UPDATE condicional é o que garante o consumo único.
    pub async fn consume(&self, conn: &mut PgConnection, uid: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE pre_generated_uids
            SET is_used = TRUE, used_at = now()
            WHERE uid = $1 AND is_used = FALSE
            "#,
        )
        .bind(uid)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn list(
        &self,
        filter: &UidFilterQuery,
    ) -> Result<(Vec<UidListRow>, i64), AppError> {
        let page = PaginationQuery { page: filter.page, limit: filter.limit };
        let used_filter: Option<bool> = match filter.status.as_deref() {
            Some("available") => Some(false),
            Some("used") => Some(true),
            _ => None,
        };
        let search = filter.search.as_deref().map(|s| format!("%{}%", s.trim()));

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM pre_generated_uids p
            LEFT JOIN warranty_registrations w ON w.uid = p.uid
            WHERE ($1::bool IS NULL OR p.is_used = $1)
              AND ($2::text IS NULL
                   OR p.uid ILIKE $2
                   OR w.customer_name ILIKE $2
                   OR w.registration_number ILIKE $2)
            "#,
        )
        .bind(used_filter)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, UidListRow>(
            r#"
            SELECT p.uid, p.is_used, p.used_at, p.created_at,
                   w.customer_name, w.registration_number
            FROM pre_generated_uids p
            LEFT JOIN warranty_registrations w ON w.uid = p.uid
            WHERE ($1::bool IS NULL OR p.is_used = $1)
              AND ($2::text IS NULL
                   OR p.uid ILIKE $2
                   OR w.customer_name ILIKE $2
                   OR w.registration_number ILIKE $2)
            ORDER BY p.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(used_filter)
        .bind(&search)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn list_for_export(&self, filter: &UidFilterQuery) -> Result<Vec<UidListRow>, AppError> {
        let used_filter: Option<bool> = match filter.status.as_deref() {
            Some("available") => Some(false),
            Some("used") => Some(true),
            _ => None,
        };
        let search = filter.search.as_deref().map(|s| format!("%{}%", s.trim()));
        let rows = sqlx::query_as::<_, UidListRow>(
            r#"
            SELECT p.uid, p.is_used, p.used_at, p.created_at,
                   w.customer_name, w.registration_number
            FROM pre_generated_uids p
            LEFT JOIN warranty_registrations w ON w.uid = p.uid
            WHERE ($1::bool IS NULL OR p.is_used = $1)
              AND ($2::text IS NULL
                   OR p.uid ILIKE $2
                   OR w.customer_name ILIKE $2
                   OR w.registration_number ILIKE $2)
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(used_filter)
        .bind(&search)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn stats(&self) -> Result<UidPoolStats, AppError> {
        let stats = sqlx::query_as::<_, UidPoolStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_used = FALSE) AS available,
                   COUNT(*) FILTER (WHERE is_used = TRUE) AS used
            FROM pre_generated_uids
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Remove um UID ainda disponível. UIDs consumidos são imutáveis.
    pub async fn delete_unused(&self, uid: &str) -> Result<(), AppError> {
        let existing = self.find(uid).await?.ok_or(AppError::NotFound("UID"))?;
        if existing.is_used {
            return Err(AppError::BadRequest(
                "Não é possível excluir um UID já utilizado em uma garantia.".to_string(),
            ));
        }
        sqlx::query("DELETE FROM pre_generated_uids WHERE uid = $1 AND is_used = FALSE")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
