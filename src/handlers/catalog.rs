// src/handlers/catalog.rs
// Catálogo de produtos: leitura pública, escrita administrativa.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{PageInfo, PaginationQuery},
    },
    config::AppState,
    middleware::rbac::{AdminOnly, RequireRole},
    models::{
        catalog::{
            Category, CreateCategoryPayload, CreateProductPayload, Product, ProductFilterQuery,
            UpdateCategoryPayload, UpdateProductPayload,
        },
        notification::{NotificationType, NotifyInput},
    },
};

#[utoipa::path(
    get,
    path = "/api/catalog/categories",
    tag = "Catalog",
    responses((status = 200, description = "Categorias ordenadas", body = Vec<Category>))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let rows = app_state.catalog_repo.list_categories().await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/catalog/products",
    tag = "Catalog",
    params(ProductFilterQuery),
    responses((status = 200, description = "Produtos ativos, filtráveis"))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(filter): Query<ProductFilterQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (rows, total) = app_state.catalog_repo.list_products(&filter, true).await?;
    let page = PaginationQuery { page: filter.page, limit: filter.limit };
    Ok(Json(serde_json::json!({
        "success": true,
        "data": rows,
        "pagination": PageInfo::new(&page, total),
    })))
}

#[utoipa::path(
    get,
    path = "/api/catalog/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Detalhe do produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = app_state
        .catalog_repo
        .find_product(id)
        .await?
        .ok_or(AppError::NotFound("Produto"))?;
    Ok(Json(product))
}

// ---
// Escrita (admin)
// ---

#[utoipa::path(
    post,
    path = "/api/catalog/categories",
    tag = "Catalog",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Slug já existente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(axum::http::StatusCode, Json<Category>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let category = app_state.catalog_repo.create_category(&payload).await?;
    Ok((axum::http::StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/catalog/categories/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    request_body = UpdateCategoryPayload,
    responses((status = 200, description = "Categoria atualizada", body = Category)),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<Json<Category>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let category = app_state
        .catalog_repo
        .update_category(id, &payload)
        .await?
        .ok_or(AppError::NotFound("Categoria"))?;
    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/api/catalog/categories/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    responses(
        (status = 200, description = "Categoria removida"),
        (status = 409, description = "Categoria ainda possui produtos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let affected = app_state.catalog_repo.delete_category(id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("Categoria"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    post,
    path = "/api/catalog/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses((status = 201, description = "Produto criado", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<(axum::http::StatusCode, Json<Product>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .catalog_repo
        .find_category(payload.category_id)
        .await?
        .ok_or(AppError::NotFound("Categoria"))?;

    let product = app_state.catalog_repo.create_product(&payload).await?;

    // Vendors ficam sabendo de produto novo no catálogo.
    let input = NotifyInput::new(
        NotificationType::Product,
        "Novo produto no catálogo",
        format!("{} já está disponível.", product.name),
    )
    .with_link(format!("/catalog/products/{}", product.id));
    if let Err(e) = app_state
        .notification_service
        .notify_role(crate::models::auth::Role::Vendor, input)
        .await
    {
        tracing::warn!("⚠️ Falha ao divulgar produto novo: {:?}", e);
    }

    Ok((axum::http::StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/catalog/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses((status = 200, description = "Produto atualizado", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    if let Some(category_id) = payload.category_id {
        app_state
            .catalog_repo
            .find_category(category_id)
            .await?
            .ok_or(AppError::NotFound("Categoria"))?;
    }
    let product = app_state
        .catalog_repo
        .update_product(id, &payload)
        .await?
        .ok_or(AppError::NotFound("Produto"))?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/catalog/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Produto removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let affected = app_state.catalog_repo.delete_product(id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("Produto"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}
