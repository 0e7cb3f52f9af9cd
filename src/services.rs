// src/services.rs
// Regras de negócio, acima dos repositórios e abaixo dos handlers.

pub mod auth;
pub mod grievance;
pub mod messaging;
pub mod notification;
pub mod scheduler;
pub mod warranty;

pub use auth::AuthService;
pub use grievance::GrievanceService;
pub use messaging::{Mailer, WhatsAppClient};
pub use notification::{NotificationHub, NotificationService};
pub use scheduler::FollowUpScheduler;
pub use warranty::WarrantyService;
