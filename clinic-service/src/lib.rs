pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

pub use startup::{build_router, AppState, Application};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::patients::list_patients,
        handlers::patients::get_patient,
        handlers::patients::create_patient,
        handlers::patients::update_patient,
        handlers::patients::complete_patient,
        handlers::reviews::create_review,
        handlers::reviews::list_reviews,
        handlers::admin::admin_login,
        handlers::admin::admin_session_status,
        handlers::admin::admin_logout,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::patients::CreatePatientRequest,
            dtos::patients::PrescriptionInput,
            dtos::patients::AppendPrescriptionsRequest,
            dtos::patients::PrescriptionResponse,
            dtos::patients::PatientResponse,
            dtos::patients::PatientEnvelope,
            dtos::reviews::CreateReviewRequest,
            dtos::reviews::ReviewResponse,
            dtos::reviews::ReviewCreatedResponse,
            dtos::reviews::ReviewListResponse,
            dtos::reviews::ReviewFailureResponse,
            dtos::admin::AdminLoginRequest,
            dtos::admin::SessionStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Patients", description = "Intake and consultation records"),
        (name = "Reviews", description = "Patient reviews"),
        (name = "Admin", description = "Admin session cookie"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("admin_session"))),
            );
        }
    }
}
