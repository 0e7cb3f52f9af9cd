// src/handlers/auth.rs

use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{
        AuthResponse, AuthUser, LoginPayload, LoginResponse, RegisterPayload, RegisterResponse,
        VerifyOtpPayload,
    },
};

// Handler de registro público (customer/vendor)
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Conta criada", body = RegisterResponse),
        (status = 409, description = "E-mail já cadastrado"),
        (status = 422, description = "Payload inválido")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(axum::http::StatusCode, Json<RegisterResponse>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let is_vendor = payload.role == crate::models::auth::Role::Vendor;
    let profile = app_state.auth_service.register(&payload).await?;

    // Vendors só entram depois da aprovação do admin.
    let message = if is_vendor {
        "Conta criada. A loja será liberada após a verificação do administrador.".to_string()
    } else {
        "Conta criada com sucesso.".to_string()
    };

    Ok((
        axum::http::StatusCode::CREATED,
        Json(RegisterResponse { success: true, message, user_id: profile.id }),
    ))
}

// Primeiro passo do login: senha -> OTP por e-mail.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "OTP enviado por e-mail", body = LoginResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let profile = app_state.auth_service.login(&payload.email, &payload.password).await?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Código de verificação enviado para o seu e-mail.".to_string(),
        user_id: profile.id,
        requires_otp: true,
    }))
}

// Segundo passo: OTP -> JWT.
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    tag = "Auth",
    request_body = VerifyOtpPayload,
    responses(
        (status = 200, description = "Login concluído", body = AuthResponse),
        (status = 401, description = "OTP inválido ou expirado")
    )
)]
pub async fn verify_otp(
    State(app_state): State<AppState>,
    Json(payload): Json<VerifyOtpPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let (token, user) = app_state
        .auth_service
        .verify_otp(payload.user_id, &payload.otp)
        .await?;

    Ok(Json(AuthResponse { success: true, token, user }))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário autenticado", body = AuthUser),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<AuthUser> {
    Json(user)
}
