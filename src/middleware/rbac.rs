// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{AuthUser, Role},
};

/// 1. O trait que define um requisito de papel
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> Role;
}

/// 2. O extractor (guardião): `RequireRole<AdminOnly>` em um handler exige
/// que o usuário injetado pelo auth_middleware tenha o papel pedido.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .ok_or(AppError::InvalidToken)?;

        if user.role != T::role() {
            return Err(AppError::Forbidden(format!(
                "Esta ação exige o papel '{}'.",
                T::role().as_str()
            )));
        }

        // Vendors ainda não verificados enxergam o portal em modo leitura.
        if T::role() == Role::Vendor && !user.is_validated {
            return Err(AppError::VendorNotVerified);
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// Papéis exigidos pelas rotas
// ---

pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn role() -> Role {
        Role::Admin
    }
}

pub struct VendorOnly;
impl RoleDef for VendorOnly {
    fn role() -> Role {
        Role::Vendor
    }
}
