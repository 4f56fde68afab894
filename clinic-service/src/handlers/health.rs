use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::AppState;

pub async fn root() -> &'static str {
    "API is running"
}

/// Liveness plus store connectivity
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store are healthy"),
        (status = 503, description = "Store unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.patients.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "clinic-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "clinic-service",
                    "error": "store unreachable"
                })),
            )
        }
    }
}

pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.patients.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        AppError::ServiceUnavailable
    })?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AdminConfig, ClinicConfig, MongoConfig, SecurityConfig, StoreBackend, TelemetryConfig,
    };
    use crate::models::{Patient, Prescription, Review};
    use crate::services::{PatientStore, ReviewStore};
    use async_trait::async_trait;
    use mongodb::bson::oid::ObjectId;
    use secrecy::Secret;
    use std::sync::Arc;

    struct UnreachableStore;

    fn down() -> AppError {
        AppError::DatabaseError(anyhow::anyhow!("server selection timeout"))
    }

    #[async_trait]
    impl PatientStore for UnreachableStore {
        async fn list(&self) -> Result<Vec<Patient>, AppError> {
            Err(down())
        }
        async fn get(&self, _: &ObjectId) -> Result<Option<Patient>, AppError> {
            Err(down())
        }
        async fn create(&self, _: Patient) -> Result<Patient, AppError> {
            Err(down())
        }
        async fn append_prescriptions(
            &self,
            _: &ObjectId,
            _: Vec<Prescription>,
            _: Vec<Prescription>,
        ) -> Result<Option<Patient>, AppError> {
            Err(down())
        }
        async fn mark_completed(&self, _: &ObjectId) -> Result<Option<Patient>, AppError> {
            Err(down())
        }
        async fn health_check(&self) -> Result<(), AppError> {
            Err(down())
        }
    }

    #[async_trait]
    impl ReviewStore for UnreachableStore {
        async fn create(&self, _: Review) -> Result<Review, AppError> {
            Err(down())
        }
        async fn list(&self) -> Result<Vec<Review>, AppError> {
            Err(down())
        }
    }

    fn state() -> AppState {
        let config = ClinicConfig {
            common: Default::default(),
            store: StoreBackend::Mongo,
            mongodb: MongoConfig {
                uri: "mongodb://unreachable:27017".into(),
                database: "clinic".into(),
            },
            admin: AdminConfig {
                user_id: "admin".into(),
                password: Secret::new("admin".into()),
                session_token: Secret::new("token".into()),
                cookie_name: "admin_session".into(),
                session_ttl_secs: 60,
                secure_cookie: false,
                protect_records: false,
            },
            security: SecurityConfig {
                allowed_origins: vec![],
                login_attempts_per_minute: 5,
                trust_forwarded_for: false,
            },
            telemetry: TelemetryConfig {
                log_level: "info".into(),
                otlp_endpoint: None,
            },
        };
        let store = Arc::new(UnreachableStore);
        AppState::new(config, store.clone(), store)
    }

    #[tokio::test]
    async fn unreachable_store_is_not_ready() {
        let err = readiness_check(State(state())).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable));
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn unreachable_store_fails_health() {
        let res = health_check(State(state())).await.into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
