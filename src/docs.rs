// src/docs.rs

use crate::handlers;
use crate::models;
use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Public ---
        handlers::public::health,
        handlers::public::list_stores,
        handlers::public::list_store_manpower,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::verify_otp,
        handlers::auth::get_me,

        // --- Vendor ---
        handlers::vendor::verify,
        handlers::vendor::get_profile,
        handlers::vendor::list_manpower,
        handlers::vendor::create_manpower,
        handlers::vendor::update_manpower,
        handlers::vendor::deactivate_manpower,
        handlers::vendor::approve_warranty,
        handlers::vendor::reject_warranty,

        // --- Warranty ---
        handlers::warranty::submit,
        handlers::warranty::list,
        handlers::warranty::get_by_uid,

        // --- UID ---
        handlers::uid::sync,
        handlers::uid::validate,
        handlers::uid::list,
        handlers::uid::export,
        handlers::uid::add,
        handlers::uid::delete,

        // --- Grievance ---
        handlers::grievance::submit,
        handlers::grievance::submit_franchise,
        handlers::grievance::list_own,
        handlers::grievance::list_franchise_submitted,
        handlers::grievance::list_admin,
        handlers::grievance::get_detail,
        handlers::grievance::list_for_vendor,
        handlers::grievance::update_status,
        handlers::grievance::admin_update,
        handlers::grievance::add_remark,
        handlers::grievance::list_remarks,
        handlers::grievance::rate,
        handlers::grievance::send_assignment,
        handlers::grievance::list_assignments,

        // --- Assignment (portal externo) ---
        handlers::assignment::details,
        handlers::assignment::update,

        // --- Notifications ---
        handlers::notification::list,
        handlers::notification::unread_count,
        handlers::notification::mark_read,
        handlers::notification::mark_all_read,
        handlers::notification::clear_one,
        handlers::notification::restore,
        handlers::notification::clear_all,
        handlers::notification::broadcast,
        handlers::ws::connect,

        // --- Catalog ---
        handlers::catalog::list_categories,
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::create_category,
        handlers::catalog::update_category,
        handlers::catalog::delete_category,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,

        // --- POSM ---
        handlers::posm::submit,
        handlers::posm::list_own,
        handlers::posm::list_admin,
        handlers::posm::get_detail,
        handlers::posm::add_message,
        handlers::posm::update_status,

        // --- Settings ---
        handlers::settings::get_public,
        handlers::settings::list_admin,
        handlers::settings::update,

        // --- Upload ---
        handlers::upload::upload,

        // --- Admin ---
        handlers::admin::stats,
        handlers::admin::list_vendors,
        handlers::admin::get_vendor,
        handlers::admin::set_vendor_verification,
        handlers::admin::delete_vendor,
        handlers::admin::list_warranties,
        handlers::admin::update_warranty_status,
        handlers::admin::export_warranties,
        handlers::admin::list_customers,
        handlers::admin::get_customer,
        handlers::admin::delete_customer,
        handlers::admin::list_admins,
        handlers::admin::create_admin,
        handlers::admin::activity_logs,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::Profile,
            models::auth::AuthUser,
            models::auth::RegisterPayload,
            models::auth::LoginPayload,
            models::auth::VerifyOtpPayload,
            models::auth::LoginResponse,
            models::auth::AuthResponse,
            models::auth::RegisterResponse,

            // --- Vendor ---
            models::vendor::VendorDetails,
            models::vendor::Manpower,
            models::vendor::CreateManpowerPayload,
            models::vendor::UpdateManpowerPayload,
            models::vendor::VendorListRow,
            models::vendor::PublicStore,
            models::vendor::VendorVerificationPayload,
            models::vendor::VendorProfileView,
            models::vendor::VendorAdminView,

            // --- Warranty ---
            models::warranty::WarrantyStatus,
            models::warranty::WarrantyRegistration,
            models::warranty::WarrantyListRow,
            models::warranty::SubmitWarrantyPayload,
            models::warranty::UpdateWarrantyStatusPayload,
            models::warranty::RejectWarrantyPayload,
            models::warranty::CustomerStatsRow,

            // --- UID ---
            models::uid::PreGeneratedUid,
            models::uid::UidListRow,
            models::uid::SyncUidsPayload,
            models::uid::AddUidPayload,
            models::uid::SyncOutcome,
            models::uid::SyncDetail,
            models::uid::SyncStats,
            models::uid::SyncResponse,
            models::uid::ValidateUidResponse,
            models::uid::UidPoolStats,

            // --- Grievance ---
            models::grievance::GrievanceStatus,
            models::grievance::GrievanceSource,
            models::grievance::Grievance,
            models::grievance::GrievanceListRow,
            models::grievance::AssignmentStatus,
            models::grievance::AssignmentType,
            models::grievance::GrievanceAssignment,
            models::grievance::AssignmentPortalView,
            models::grievance::GrievanceRemark,
            models::grievance::SubmitGrievancePayload,
            models::grievance::SubmitFranchiseGrievancePayload,
            models::grievance::UpdateGrievanceStatusPayload,
            models::grievance::AdminUpdateGrievancePayload,
            models::grievance::AddRemarkPayload,
            models::grievance::RatingPayload,
            models::grievance::SendAssignmentPayload,
            models::grievance::AssignmentUpdatePayload,

            // --- Notifications ---
            models::notification::NotificationType,
            models::notification::Notification,
            models::notification::BroadcastPayload,
            models::notification::UnreadCountResponse,

            // --- Catalog ---
            models::catalog::Category,
            models::catalog::Product,
            models::catalog::ProductListRow,
            models::catalog::CreateCategoryPayload,
            models::catalog::UpdateCategoryPayload,
            models::catalog::CreateProductPayload,
            models::catalog::UpdateProductPayload,

            // --- POSM ---
            models::posm::PosmStatus,
            models::posm::PosmSenderRole,
            models::posm::PosmRequest,
            models::posm::PosmRequestListRow,
            models::posm::PosmMessage,
            models::posm::PosmTicketView,
            models::posm::SubmitPosmPayload,
            models::posm::PosmMessagePayload,
            models::posm::UpdatePosmPayload,

            // --- Settings ---
            models::settings::SystemSetting,
            models::settings::UpdateSettingPayload,
            models::settings::SettingResponse,

            // --- Admin ---
            models::admin::DashboardStats,
            models::admin::CreateAdminPayload,
            models::admin::AdminListRow,
            models::admin::ActivityLog,

            // --- Upload ---
            handlers::upload::UploadResponse,
        )
    ),
    tags(
        (name = "Public", description = "Endpoints abertos (lojas, health check)"),
        (name = "Auth", description = "Registro, login em duas etapas e perfil"),
        (name = "Vendor", description = "Perfil da loja e equipe de instaladores"),
        (name = "Warranty", description = "Registro e ciclo de vida de garantias"),
        (name = "UID", description = "Pool de seriais pré-gerados"),
        (name = "Grievance", description = "Chamados de reclamação e atribuições externas"),
        (name = "Assignment", description = "Portal público do responsável externo"),
        (name = "Notifications", description = "Notificações in-app e tempo real"),
        (name = "Catalog", description = "Catálogo de produtos e categorias"),
        (name = "POSM", description = "Tickets de material de ponto de venda"),
        (name = "Settings", description = "Configurações do portal"),
        (name = "Upload", description = "Upload de anexos"),
        (name = "Admin", description = "Dashboard e operações administrativas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
