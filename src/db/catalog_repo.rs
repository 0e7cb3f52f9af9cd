// src/db/catalog_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PaginationQuery},
    models::catalog::{
        Category, CreateCategoryPayload, CreateProductPayload, Product, ProductFilterQuery,
        ProductListRow, UpdateCategoryPayload, UpdateProductPayload, slugify,
    },
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Categorias
    // ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories ORDER BY display_order ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let row = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_category(
        &self,
        payload: &CreateCategoryPayload,
    ) -> Result<Category, AppError> {
        let slug = slugify(&payload.name);
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, description, display_order)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&slug)
        .bind(&payload.description)
        .bind(payload.display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!(
                        "Já existe uma categoria com o slug '{slug}'."
                    ));
                }
            }
            e.into()
        })
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        payload: &UpdateCategoryPayload,
    ) -> Result<Option<Category>, AppError> {
        // O slug acompanha o nome quando ele muda.
        let slug = payload.name.as_deref().map(slugify);
        let row = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                display_order = COALESCE($5, display_order)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&slug)
        .bind(&payload.description)
        .bind(payload.display_order)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Categorias com produtos não podem ser removidas.
    pub async fn delete_category(&self, id: Uuid) -> Result<u64, AppError> {
        let in_use = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE category_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if in_use > 0 {
            return Err(AppError::Conflict(
                "A categoria possui produtos e não pode ser excluída.".to_string(),
            ));
        }
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Produtos
    // ---

    pub async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let row = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_products(
        &self,
        filter: &ProductFilterQuery,
        only_active: bool,
    ) -> Result<(Vec<ProductListRow>, i64), AppError> {
        let page = PaginationQuery { page: filter.page, limit: filter.limit };
        let search = filter.search.as_deref().map(|s| format!("%{}%", s.trim()));

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM products pr
            WHERE ($1::uuid IS NULL OR pr.category_id = $1)
              AND ($2::text IS NULL OR pr.name ILIKE $2 OR pr.description ILIKE $2)
              AND ($3::bool IS NULL OR pr.is_featured = $3)
              AND ($4 = FALSE OR pr.is_active = TRUE)
            "#,
        )
        .bind(filter.category)
        .bind(&search)
        .bind(filter.featured)
        .bind(only_active)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductListRow>(
            r#"
            SELECT pr.id, pr.category_id, c.name AS category_name, pr.name,
                   pr.description, pr.price, pr.images, pr.is_active, pr.is_featured,
                   pr.created_at
            FROM products pr
            JOIN categories c ON c.id = pr.category_id
            WHERE ($1::uuid IS NULL OR pr.category_id = $1)
              AND ($2::text IS NULL OR pr.name ILIKE $2 OR pr.description ILIKE $2)
              AND ($3::bool IS NULL OR pr.is_featured = $3)
              AND ($4 = FALSE OR pr.is_active = TRUE)
            ORDER BY pr.created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.category)
        .bind(&search)
        .bind(filter.featured)
        .bind(only_active)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn create_product(
        &self,
        payload: &CreateProductPayload,
    ) -> Result<Product, AppError> {
        let images = serde_json::to_value(&payload.images)?;
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (category_id, name, description, price, images, is_active, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(payload.category_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(images)
        .bind(payload.is_active)
        .bind(payload.is_featured)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError> {
        let images = payload
            .images
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let row = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                images = COALESCE($6, images),
                is_active = COALESCE($7, is_active),
                is_featured = COALESCE($8, is_featured),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.category_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(images)
        .bind(payload.is_active)
        .bind(payload.is_featured)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
