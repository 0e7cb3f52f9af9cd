// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    db::{
        ActivityLogRepository, CatalogRepository, GrievanceRepository, MessageLogRepository,
        NotificationRepository, PosmRepository, SettingsRepository, UidRepository,
        UserRepository, VendorRepository, WarrantyRepository,
    },
    services::{
        AuthService, GrievanceService, Mailer, NotificationHub, NotificationService,
        WarrantyService, WhatsAppClient,
        messaging::{SmtpConfig, WhatsAppConfig},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,

    // Segredos e caminhos vindos do ambiente.
    pub jwt_secret: String,
    pub uid_sync_api_key: String,
    pub app_url: String,
    pub upload_dir: String,

    // Repositórios
    pub user_repo: UserRepository,
    pub vendor_repo: VendorRepository,
    pub warranty_repo: WarrantyRepository,
    pub uid_repo: UidRepository,
    pub grievance_repo: GrievanceRepository,
    pub notification_repo: NotificationRepository,
    pub catalog_repo: CatalogRepository,
    pub posm_repo: PosmRepository,
    pub settings_repo: SettingsRepository,
    pub activity_repo: ActivityLogRepository,

    // Serviços
    pub auth_service: AuthService,
    pub notification_service: NotificationService,
    pub warranty_service: WarrantyService,
    pub grievance_service: GrievanceService,
    pub mailer: Mailer,
    pub whatsapp: WhatsAppClient,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let uid_sync_api_key =
            env::var("UID_SYNC_API_KEY").expect("UID_SYNC_API_KEY deve ser definida");
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let admin_email = env::var("ADMIN_EMAIL").ok();
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let db_pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let vendor_repo = VendorRepository::new(db_pool.clone());
        let warranty_repo = WarrantyRepository::new(db_pool.clone());
        let uid_repo = UidRepository::new(db_pool.clone());
        let grievance_repo = GrievanceRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let posm_repo = PosmRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let activity_repo = ActivityLogRepository::new(db_pool.clone());
        let message_log_repo = MessageLogRepository::new(db_pool.clone());

        let mailer = Mailer::new(smtp_config_from_env(), message_log_repo.clone());
        let whatsapp = WhatsAppClient::new(whatsapp_config_from_env(), message_log_repo);

        let hub = NotificationHub::new();
        let notification_service =
            NotificationService::new(notification_repo.clone(), user_repo.clone(), hub);

        let auth_service = AuthService::new(
            user_repo.clone(),
            vendor_repo.clone(),
            mailer.clone(),
            jwt_secret.clone(),
            app_url.clone(),
            admin_email,
            db_pool.clone(),
        );
        let warranty_service = WarrantyService::new(
            warranty_repo.clone(),
            uid_repo.clone(),
            vendor_repo.clone(),
            notification_service.clone(),
            mailer.clone(),
            whatsapp.clone(),
            db_pool.clone(),
        );
        let grievance_service = GrievanceService::new(
            grievance_repo.clone(),
            user_repo.clone(),
            vendor_repo.clone(),
            notification_service.clone(),
            mailer.clone(),
            app_url.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            jwt_secret,
            uid_sync_api_key,
            app_url,
            upload_dir,
            user_repo,
            vendor_repo,
            warranty_repo,
            uid_repo,
            grievance_repo,
            notification_repo,
            catalog_repo,
            posm_repo,
            settings_repo,
            activity_repo,
            auth_service,
            notification_service,
            warranty_service,
            grievance_service,
            mailer,
            whatsapp,
        })
    }
}

// SMTP é opcional: sem as variáveis, o Mailer roda em modo de
// desenvolvimento e só loga o conteúdo.
fn smtp_config_from_env() -> Option<SmtpConfig> {
    let host = env::var("SMTP_HOST").ok()?;
    let username = env::var("SMTP_USERNAME").ok()?;
    let password = env::var("SMTP_PASSWORD").ok()?;
    let port = env::var("SMTP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(465);
    let from_address =
        env::var("SMTP_FROM_ADDRESS").unwrap_or_else(|_| username.clone());
    let from_name =
        env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Portal de Garantias".to_string());
    let implicit_tls = port == 465;

    Some(SmtpConfig { host, port, username, password, from_address, from_name, implicit_tls })
}

fn whatsapp_config_from_env() -> Option<WhatsAppConfig> {
    let api_url = env::var("WHATSAPP_API_URL").ok()?;
    let api_token = env::var("WHATSAPP_API_TOKEN").ok()?;
    Some(WhatsAppConfig { api_url, api_token })
}
