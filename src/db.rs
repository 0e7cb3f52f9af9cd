// src/db.rs
// A camada de acesso a dados: um repositório por agregado.

pub mod activity_log_repo;
pub mod catalog_repo;
pub mod grievance_repo;
pub mod message_log_repo;
pub mod notification_repo;
pub mod posm_repo;
pub mod settings_repo;
pub mod uid_repo;
pub mod user_repo;
pub mod vendor_repo;
pub mod warranty_repo;

pub use activity_log_repo::ActivityLogRepository;
pub use catalog_repo::CatalogRepository;
pub use grievance_repo::GrievanceRepository;
pub use message_log_repo::MessageLogRepository;
pub use notification_repo::NotificationRepository;
pub use posm_repo::PosmRepository;
pub use settings_repo::SettingsRepository;
pub use uid_repo::UidRepository;
pub use user_repo::UserRepository;
pub use vendor_repo::VendorRepository;
pub use warranty_repo::WarrantyRepository;
