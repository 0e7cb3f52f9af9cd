// src/db/vendor_repo.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PaginationQuery},
    models::{
        admin::VendorFilterQuery,
        vendor::{CreateManpowerPayload, Manpower, PublicStore, UpdateManpowerPayload,
                 VendorDetails, VendorListRow},
    },
};

#[derive(Clone)]
pub struct VendorRepository {
    pool: PgPool,
}

impl VendorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<VendorDetails>, AppError> {
        let details = sqlx::query_as::<_, VendorDetails>(
            "SELECT * FROM vendor_details WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(details)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<VendorDetails>, AppError> {
        let details = sqlx::query_as::<_, VendorDetails>(
            "SELECT * FROM vendor_details WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(details)
    }

    // Criada junto com o perfil, na mesma transação de registro.
    pub async fn create_details(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        store_name: &str,
        store_code: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
    ) -> Result<VendorDetails, AppError> {
        let details = sqlx::query_as::<_, VendorDetails>(
            r#"
            INSERT INTO vendor_details (user_id, store_name, store_code, city, state)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(store_name)
        .bind(store_code)
        .bind(city)
        .bind(state)
        .fetch_one(conn)
        .await?;
        Ok(details)
    }

    /// Listagem administrativa com busca por loja/nome/e-mail.
    pub async fn list_vendors(
        &self,
        filter: &VendorFilterQuery,
    ) -> Result<(Vec<VendorListRow>, i64), AppError> {
        let page = PaginationQuery { page: filter.page, limit: filter.limit };
        let search = filter
            .search
            .as_deref()
            .map(|s| format!("%{}%", s.trim()));

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM vendor_details vd
            JOIN profiles p ON p.id = vd.user_id
            JOIN vendor_verification vv ON vv.user_id = vd.user_id
            WHERE ($1::text IS NULL
                   OR vd.store_name ILIKE $1 OR p.name ILIKE $1 OR p.email ILIKE $1)
              AND ($2::bool IS NULL OR vv.is_verified = $2)
            "#,
        )
        .bind(&search)
        .bind(filter.verified)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, VendorListRow>(
            r#"
            SELECT vd.id, vd.user_id, vd.store_name, vd.store_code, vd.city, vd.state,
                   p.name, p.email, p.phone_number, vv.is_verified, vd.created_at
            FROM vendor_details vd
            JOIN profiles p ON p.id = vd.user_id
            JOIN vendor_verification vv ON vv.user_id = vd.user_id
            WHERE ($1::text IS NULL
                   OR vd.store_name ILIKE $1 OR p.name ILIKE $1 OR p.email ILIKE $1)
              AND ($2::bool IS NULL OR vv.is_verified = $2)
            ORDER BY vd.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&search)
        .bind(filter.verified)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// (total de lojas, lojas verificadas) para o dashboard.
    pub async fn vendor_counts(&self) -> Result<(i64, i64), AppError> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE vv.is_verified)
            FROM vendor_details vd
            JOIN vendor_verification vv ON vv.user_id = vd.user_id
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    pub async fn get_vendor_row(&self, id: Uuid) -> Result<Option<VendorListRow>, AppError> {
        let row = sqlx::query_as::<_, VendorListRow>(
            r#"
            SELECT vd.id, vd.user_id, vd.store_name, vd.store_code, vd.city, vd.state,
                   p.name, p.email, p.phone_number, vv.is_verified, vd.created_at
            FROM vendor_details vd
            JOIN profiles p ON p.id = vd.user_id
            JOIN vendor_verification vv ON vv.user_id = vd.user_id
            WHERE vd.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // ---
    // Manpower (instaladores da loja)
    // ---

    pub async fn list_manpower(
        &self,
        vendor_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<Manpower>, AppError> {
        let rows = sqlx::query_as::<_, Manpower>(
            r#"
            SELECT * FROM manpower
            WHERE vendor_id = $1 AND ($2 = FALSE OR is_active = TRUE)
            ORDER BY name ASC
            "#,
        )
        .bind(vendor_id)
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_manpower(&self, id: Uuid) -> Result<Option<Manpower>, AppError> {
        let row = sqlx::query_as::<_, Manpower>("SELECT * FROM manpower WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_manpower(
        &self,
        vendor_id: Uuid,
        payload: &CreateManpowerPayload,
    ) -> Result<Manpower, AppError> {
        let row = sqlx::query_as::<_, Manpower>(
            r#"
            INSERT INTO manpower (vendor_id, name, phone, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(vendor_id)
        .bind(&payload.name)
        .bind(&payload.phone)
        .bind(&payload.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_manpower(
        &self,
        id: Uuid,
        vendor_id: Uuid,
        payload: &UpdateManpowerPayload,
    ) -> Result<Option<Manpower>, AppError> {
        let row = sqlx::query_as::<_, Manpower>(
            r#"
            UPDATE manpower
            SET name = COALESCE($3, name),
                phone = COALESCE($4, phone),
                role = COALESCE($5, role),
                is_active = COALESCE($6, is_active)
            WHERE id = $1 AND vendor_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(vendor_id)
        .bind(&payload.name)
        .bind(&payload.phone)
        .bind(&payload.role)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // Desativação lógica: o histórico de garantias continua apontando para cá.
    pub async fn deactivate_manpower(&self, id: Uuid, vendor_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE manpower SET is_active = FALSE WHERE id = $1 AND vendor_id = $2",
        )
        .bind(id)
        .bind(vendor_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Visões públicas (formulário de registro de garantia)
    // ---

    pub async fn list_public_stores(&self) -> Result<Vec<PublicStore>, AppError> {
        let rows = sqlx::query_as::<_, PublicStore>(
            r#"
            SELECT vd.id, vd.store_name, vd.store_code, vd.city, vd.state
            FROM vendor_details vd
            JOIN vendor_verification vv ON vv.user_id = vd.user_id
            WHERE vv.is_verified = TRUE
            ORDER BY vd.store_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete_vendor(&self, id: Uuid) -> Result<Option<Uuid>, AppError> {
        // O perfil cai por cascata das FKs; devolvemos o user_id para o chamador
        // remover o perfil e registrar a auditoria.
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM vendor_details WHERE id = $1 RETURNING user_id",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user_id)
    }
}
