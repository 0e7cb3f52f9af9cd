// src/db/warranty_repo.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PaginationQuery},
    models::warranty::{
        CustomerStatsRow, SubmitWarrantyPayload, WarrantyFilterQuery, WarrantyListRow,
        WarrantyRegistration, WarrantyStatus,
    },
};

const LIST_COLUMNS: &str = r#"
    wr.id, wr.uid, wr.product_type, wr.customer_name, wr.customer_email,
    wr.customer_phone, wr.car_make, wr.car_model, wr.registration_number,
    wr.warranty_type, wr.status, wr.rejection_reason, wr.created_at,
    p.name AS submitted_by_name, p.email AS submitted_by_email,
    m.name AS manpower_name
"#;

#[derive(Clone)]
pub struct WarrantyRepository {
    pool: PgPool,
}

impl WarrantyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Insere o registro dentro da transação que consome o UID.
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        status: WarrantyStatus,
        payload: &SubmitWarrantyPayload,
    ) -> Result<WarrantyRegistration, AppError> {
        let row = sqlx::query_as::<_, WarrantyRegistration>(
            r#"
            INSERT INTO warranty_registrations
                (uid, user_id, product_type, customer_name, customer_email, customer_phone,
                 customer_address, car_make, car_model, car_year, registration_number,
                 purchase_date, installer_name, installer_contact, product_details,
                 manpower_id, warranty_type, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(&payload.uid)
        .bind(user_id)
        .bind(&payload.product_type)
        .bind(&payload.customer_name)
        .bind(&payload.customer_email)
        .bind(&payload.customer_phone)
        .bind(&payload.customer_address)
        .bind(&payload.car_make)
        .bind(&payload.car_model)
        .bind(&payload.car_year)
        .bind(&payload.registration_number)
        .bind(payload.purchase_date)
        .bind(&payload.installer_name)
        .bind(&payload.installer_contact)
        .bind(&payload.product_details)
        .bind(payload.manpower_id)
        .bind(&payload.warranty_type)
        .bind(status)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::UidAlreadyUsed(payload.uid.clone());
                }
            }
            e.into()
        })?;
        Ok(row)
    }

    pub async fn find_by_uid(&self, uid: &str) -> Result<Option<WarrantyRegistration>, AppError> {
        let row = sqlx::query_as::<_, WarrantyRegistration>(
            "SELECT * FROM warranty_registrations WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &PaginationQuery,
    ) -> Result<(Vec<WarrantyRegistration>, i64), AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM warranty_registrations WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, WarrantyRegistration>(
            r#"
            SELECT * FROM warranty_registrations
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Garantias visíveis para uma loja: as submetidas pelo vendor e as que
    /// apontam para um instalador da loja.
    pub async fn list_for_vendor(
        &self,
        vendor_user_id: Uuid,
        vendor_details_id: Uuid,
        page: &PaginationQuery,
    ) -> Result<(Vec<WarrantyRegistration>, i64), AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM warranty_registrations wr
            LEFT JOIN manpower m ON m.id = wr.manpower_id
            WHERE wr.user_id = $1 OR m.vendor_id = $2
            "#,
        )
        .bind(vendor_user_id)
        .bind(vendor_details_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, WarrantyRegistration>(
            r#"
            SELECT wr.*
            FROM warranty_registrations wr
            LEFT JOIN manpower m ON m.id = wr.manpower_id
            WHERE wr.user_id = $1 OR m.vendor_id = $2
            ORDER BY wr.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(vendor_user_id)
        .bind(vendor_details_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn list_all(
        &self,
        filter: &WarrantyFilterQuery,
    ) -> Result<(Vec<WarrantyListRow>, i64), AppError> {
        let page = PaginationQuery { page: filter.page, limit: filter.limit };
        let search = filter.search.as_deref().map(|s| format!("%{}%", s.trim()));

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM warranty_registrations wr
            WHERE ($1::warranty_status IS NULL OR wr.status = $1)
              AND ($2::text IS NULL
                   OR wr.customer_name ILIKE $2
                   OR wr.customer_email ILIKE $2
                   OR wr.registration_number ILIKE $2
                   OR wr.uid ILIKE $2)
            "#,
        )
        .bind(filter.status)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            r#"
            SELECT {LIST_COLUMNS}
            FROM warranty_registrations wr
            LEFT JOIN profiles p ON p.id = wr.user_id
            LEFT JOIN manpower m ON m.id = wr.manpower_id
            WHERE ($1::warranty_status IS NULL OR wr.status = $1)
              AND ($2::text IS NULL
                   OR wr.customer_name ILIKE $2
                   OR wr.customer_email ILIKE $2
                   OR wr.registration_number ILIKE $2
                   OR wr.uid ILIKE $2)
            ORDER BY wr.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, WarrantyListRow>(&query)
            .bind(filter.status)
            .bind(&search)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Mesmo filtro da listagem, sem paginação, para o export CSV.
    pub async fn list_all_for_export(
        &self,
        filter: &WarrantyFilterQuery,
    ) -> Result<Vec<WarrantyListRow>, AppError> {
        let search = filter.search.as_deref().map(|s| format!("%{}%", s.trim()));
        let query = format!(
            r#"
            SELECT {LIST_COLUMNS}
            FROM warranty_registrations wr
            LEFT JOIN profiles p ON p.id = wr.user_id
            LEFT JOIN manpower m ON m.id = wr.manpower_id
            WHERE ($1::warranty_status IS NULL OR wr.status = $1)
              AND ($2::text IS NULL
                   OR wr.customer_name ILIKE $2
                   OR wr.customer_email ILIKE $2
                   OR wr.registration_number ILIKE $2
                   OR wr.uid ILIKE $2)
            ORDER BY wr.created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, WarrantyListRow>(&query)
            .bind(filter.status)
            .bind(&search)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn update_status(
        &self,
        uid: &str,
        status: WarrantyStatus,
        rejection_reason: Option<&str>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE warranty_registrations
            SET status = $2, rejection_reason = $3, status_updated_at = now()
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .bind(status)
        .bind(rejection_reason)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_status(&self, status: WarrantyStatus) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM warranty_registrations WHERE status = $1",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_all(&self) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM warranty_registrations")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn count_for_vendor(
        &self,
        vendor_user_id: Uuid,
        vendor_details_id: Uuid,
        status: Option<WarrantyStatus>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM warranty_registrations wr
            LEFT JOIN manpower m ON m.id = wr.manpower_id
            WHERE (wr.user_id = $1 OR m.vendor_id = $2)
              AND ($3::warranty_status IS NULL OR wr.status = $3)
            "#,
        )
        .bind(vendor_user_id)
        .bind(vendor_details_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_customers(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT customer_email) FROM warranty_registrations",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // Clientes únicos por e-mail, com estatísticas agregadas.
    pub async fn customers_with_stats(&self) -> Result<Vec<CustomerStatsRow>, AppError> {
        let rows = sqlx::query_as::<_, CustomerStatsRow>(
            r#"
            SELECT
                MAX(customer_name) AS customer_name,
                customer_email,
                MAX(customer_phone) AS customer_phone,
                COUNT(*) AS total_warranties,
                COUNT(*) FILTER (WHERE status = 'validated') AS validated_warranties,
                COUNT(*) FILTER (WHERE status IN ('pending', 'pending_vendor')) AS pending_warranties,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected_warranties,
                MIN(created_at) AS first_warranty_date,
                MAX(created_at) AS last_warranty_date
            FROM warranty_registrations
            GROUP BY customer_email
            ORDER BY MAX(created_at) DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_customer_email(
        &self,
        email: &str,
    ) -> Result<Vec<WarrantyRegistration>, AppError> {
        let rows = sqlx::query_as::<_, WarrantyRegistration>(
            r#"
            SELECT * FROM warranty_registrations
            WHERE customer_email = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete_by_customer_email(&self, email: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM warranty_registrations WHERE customer_email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
