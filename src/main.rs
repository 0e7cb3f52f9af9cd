// src/main.rs

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::{
    api_key::api_key_middleware,
    auth::auth_middleware,
    rate_limit::{RateLimitState, rate_limit_middleware},
};
use crate::services::FollowUpScheduler;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    tokio::fs::create_dir_all(&app_state.upload_dir)
        .await
        .expect("Falha ao criar o diretório de uploads.");

    // Scheduler de follow-up roda ao lado do servidor e para junto com ele.
    let shutdown_token = CancellationToken::new();
    let scheduler = FollowUpScheduler::new(
        app_state.grievance_repo.clone(),
        app_state.user_repo.clone(),
        app_state.mailer.clone(),
        app_state.app_url.clone(),
        app_state.db_pool.clone(),
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_token.clone()));

    // 10 tentativas por IP a cada 15 minutos nos endpoints de login.
    let login_limiter = RateLimitState::new(10, Duration::from_secs(15 * 60));

    // Rotas de autenticação (públicas, com rate limit).
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/verify-otp", post(handlers::auth::verify_otp))
        .layer(axum_middleware::from_fn_with_state(
            login_limiter,
            rate_limit_middleware,
        ))
        .route(
            "/me",
            get(handlers::auth::get_me).layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                auth_middleware,
            )),
        );

    // Endpoints abertos: formulário público, portal de atribuição,
    // configurações exibidas no site e leitura do catálogo.
    let public_routes = Router::new()
        .route("/health", get(handlers::public::health))
        .route("/public/stores", get(handlers::public::list_stores))
        .route("/vendor/verify", get(handlers::vendor::verify))
        .route(
            "/public/stores/{id}/manpower",
            get(handlers::public::list_store_manpower),
        )
        .route("/assignment/details/{token}", get(handlers::assignment::details))
        .route("/assignment/update/{token}", post(handlers::assignment::update))
        .route("/settings/public/{key}", get(handlers::settings::get_public))
        .route("/catalog/categories", get(handlers::catalog::list_categories))
        .route("/catalog/products", get(handlers::catalog::list_products))
        .route("/catalog/products/{id}", get(handlers::catalog::get_product))
        .route("/ws", get(handlers::ws::connect));

    // O sistema externo de UIDs autentica por x-api-key, não por JWT.
    let uid_sync_routes = Router::new()
        .route("/uid/sync", post(handlers::uid::sync))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            api_key_middleware,
        ));

    // Tudo abaixo exige JWT; os guards de papel ficam nos handlers.
    let protected_routes = Router::new()
        // Vendor
        .route("/vendor/profile", get(handlers::vendor::get_profile))
        .route(
            "/vendor/manpower",
            get(handlers::vendor::list_manpower).post(handlers::vendor::create_manpower),
        )
        .route(
            "/vendor/manpower/{id}",
            put(handlers::vendor::update_manpower)
                .delete(handlers::vendor::deactivate_manpower),
        )
        .route(
            "/vendor/warranties/{uid}/approve",
            post(handlers::vendor::approve_warranty),
        )
        .route(
            "/vendor/warranties/{uid}/reject",
            post(handlers::vendor::reject_warranty),
        )
        // Garantias
        .route("/warranty/submit", post(handlers::warranty::submit))
        .route("/warranty", get(handlers::warranty::list))
        .route("/warranty/{uid}", get(handlers::warranty::get_by_uid))
        // Pool de UIDs
        .route("/uid", get(handlers::uid::list))
        .route("/uid/validate/{uid}", get(handlers::uid::validate))
        .route("/uid/export", get(handlers::uid::export))
        .route("/uid/add", post(handlers::uid::add))
        .route("/uid/{uid}", delete(handlers::uid::delete))
        // Chamados
        .route(
            "/grievance",
            post(handlers::grievance::submit).get(handlers::grievance::list_own),
        )
        .route("/grievance/franchise", post(handlers::grievance::submit_franchise))
        .route(
            "/grievance/franchise/submitted",
            get(handlers::grievance::list_franchise_submitted),
        )
        .route("/grievance/admin", get(handlers::grievance::list_admin))
        .route("/grievance/vendor", get(handlers::grievance::list_for_vendor))
        .route("/grievance/{id}", get(handlers::grievance::get_detail))
        .route("/grievance/{id}/status", put(handlers::grievance::update_status))
        .route("/grievance/{id}/admin-update", put(handlers::grievance::admin_update))
        .route(
            "/grievance/{id}/remarks",
            put(handlers::grievance::add_remark).get(handlers::grievance::list_remarks),
        )
        .route("/grievance/{id}/rating", put(handlers::grievance::rate))
        .route(
            "/grievance/{id}/send-assignment-email",
            post(handlers::grievance::send_assignment),
        )
        .route("/grievance/{id}/assignments", get(handlers::grievance::list_assignments))
        // Notificações
        .route(
            "/notifications",
            get(handlers::notification::list).delete(handlers::notification::clear_all),
        )
        .route("/notifications/unread-count", get(handlers::notification::unread_count))
        .route("/notifications/read-all", patch(handlers::notification::mark_all_read))
        .route("/notifications/broadcast", post(handlers::notification::broadcast))
        .route("/notifications/{id}", delete(handlers::notification::clear_one))
        .route("/notifications/{id}/read", patch(handlers::notification::mark_read))
        .route("/notifications/{id}/restore", patch(handlers::notification::restore))
        // Catálogo (escrita administrativa)
        .route("/catalog/categories", post(handlers::catalog::create_category))
        .route(
            "/catalog/categories/{id}",
            put(handlers::catalog::update_category).delete(handlers::catalog::delete_category),
        )
        .route("/catalog/products", post(handlers::catalog::create_product))
        .route(
            "/catalog/products/{id}",
            put(handlers::catalog::update_product).delete(handlers::catalog::delete_product),
        )
        // POSM
        .route("/posm", post(handlers::posm::submit).get(handlers::posm::list_own))
        .route("/posm/admin/all", get(handlers::posm::list_admin))
        .route("/posm/{id}", get(handlers::posm::get_detail))
        .route("/posm/{id}/messages", post(handlers::posm::add_message))
        .route("/posm/{id}/status", put(handlers::posm::update_status))
        // Configurações (admin)
        .route("/settings/admin", get(handlers::settings::list_admin))
        .route("/settings/admin/{key}", put(handlers::settings::update))
        // Upload: o limite padrão de corpo do axum (2MB) não comporta os
        // vídeos permitidos; a folga cobre o framing do multipart.
        .route(
            "/upload",
            post(handlers::upload::upload)
                .layer(DefaultBodyLimit::max(handlers::upload::MAX_FILE_BYTES + 1024)),
        )
        // Admin
        .route("/admin/stats", get(handlers::admin::stats))
        .route("/admin/vendors", get(handlers::admin::list_vendors))
        .route(
            "/admin/vendors/{id}",
            get(handlers::admin::get_vendor).delete(handlers::admin::delete_vendor),
        )
        .route(
            "/admin/vendors/{id}/verification",
            put(handlers::admin::set_vendor_verification),
        )
        .route("/admin/warranties", get(handlers::admin::list_warranties))
        .route("/admin/warranties/export", get(handlers::admin::export_warranties))
        .route(
            "/admin/warranties/{uid}/status",
            put(handlers::admin::update_warranty_status),
        )
        .route("/admin/customers", get(handlers::admin::list_customers))
        .route(
            "/admin/customers/{email}",
            get(handlers::admin::get_customer).delete(handlers::admin::delete_customer),
        )
        .route(
            "/admin/admins",
            get(handlers::admin::list_admins).post(handlers::admin::create_admin),
        )
        .route("/admin/activity-logs", get(handlers::admin::activity_logs))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let upload_dir = app_state.upload_dir.clone();
    let app = Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api", uid_sync_routes)
        .nest("/api", protected_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("🛑 Encerrando: sinal de shutdown recebido");
            shutdown_token.cancel();
        })
        .await
        .expect("Erro no servidor Axum");

    let _ = scheduler_handle.await;
}
