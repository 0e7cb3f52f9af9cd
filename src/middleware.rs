// src/middleware.rs

pub mod api_key;
pub mod auth;
pub mod rate_limit;
pub mod rbac;
