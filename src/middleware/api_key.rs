// src/middleware/api_key.rs
// Guarda do endpoint de sincronização de UIDs: o sistema externo não tem
// JWT, ele se apresenta com um segredo compartilhado no header x-api-key.

use axum::{
    extract::State,
    middleware::Next,
    response::Response,
};

use crate::{common::error::AppError, config::AppState};

pub async fn api_key_middleware(
    State(app_state): State<AppState>,
    request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if key == app_state.uid_sync_api_key => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("🔑 Tentativa de sync com x-api-key inválida");
            Err(AppError::Forbidden("Chave de API inválida.".to_string()))
        }
        None => Err(AppError::Forbidden("O header x-api-key é obrigatório.".to_string())),
    }
}
