// src/handlers/upload.rs
// Upload de anexos (fotos, notas fiscais, vídeos) servidos depois em /uploads.

use axum::{Json, extract::Multipart, extract::State};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

// O roteador precisa elevar o DefaultBodyLimit do axum até este teto,
// senão o corpo é cortado nos 2MB padrão antes de chegar aqui.
pub const MAX_FILE_BYTES: usize = 50 * 1024 * 1024;
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf", "mp4", "webm", "xlsx"];

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_name: String,
}

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "Upload",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Arquivo gravado", body = UploadResponse),
        (status = 400, description = "Extensão não permitida ou arquivo grande demais")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart inválido: {e}")))?
        .ok_or_else(|| AppError::BadRequest("Nenhum arquivo enviado.".to_string()))?;

    let original_name = field.file_name().unwrap_or("").to_string();
    let Some(extension) = extension_of(&original_name) else {
        return Err(AppError::BadRequest(format!(
            "O arquivo não tem extensão. Aceitas: {}.",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    };
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Extensão '.{extension}' não permitida. Aceitas: {}.",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Falha ao ler o arquivo: {e}")))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("O arquivo está vazio.".to_string()));
    }
    if data.len() > MAX_FILE_BYTES {
        return Err(AppError::BadRequest(
            "O arquivo excede o limite de 50MB.".to_string(),
        ));
    }

    // Nome aleatório: nunca confiamos no nome vindo do cliente.
    let file_name = format!("{}.{extension}", Uuid::new_v4());
    let path = std::path::Path::new(&app_state.upload_dir).join(&file_name);
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao gravar o upload: {}", e))?;

    tracing::info!("📎 {} enviou {} ({} bytes)", user.email, file_name, data.len());

    Ok(Json(UploadResponse {
        success: true,
        url: format!("/uploads/{file_name}"),
        file_name,
    }))
}

/// Extensão do nome enviado, minúscula. Nome sem ponto não tem extensão.
fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        extract::DefaultBodyLimit,
        http::{Request, StatusCode},
        routing::post,
    };
    use tower::ServiceExt;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("video.MP4"), Some("mp4".to_string()));
        assert_eq!(extension_of("nota.fiscal.pdf"), Some("pdf".to_string()));
    }

    #[test]
    fn dotless_name_has_no_extension() {
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(""), None);
    }

    // Corpos cortados pelo limite padrão chegam como erro de multipart;
    // respondemos 400 como o handler real.
    async fn field_size(mut multipart: Multipart) -> Result<String, StatusCode> {
        let field = multipart
            .next_field()
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?
            .ok_or(StatusCode::BAD_REQUEST)?;
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        Ok(data.len().to_string())
    }

    fn multipart_request(payload_len: usize) -> Request<Body> {
        let boundary = "teto-de-upload";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"video.mp4\"\r\n\
              Content-Type: video/mp4\r\n\r\n",
        );
        body.extend_from_slice(&vec![0u8; payload_len]);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    // O limite padrão do axum (2MB) cortaria um vídeo válido; a rota de
    // upload precisa da camada DefaultBodyLimit com o nosso teto.
    #[tokio::test]
    async fn body_limit_layer_accepts_files_above_two_megabytes() {
        let app = Router::new().route(
            "/upload",
            post(field_size).layer(DefaultBodyLimit::max(MAX_FILE_BYTES + 1024)),
        );

        let response = app.oneshot(multipart_request(3 * 1024 * 1024)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn default_body_limit_rejects_the_same_file() {
        let app = Router::new().route("/upload", post(field_size));

        let response = app.oneshot(multipart_request(3 * 1024 * 1024)).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
