#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use clinic_service::config::{
    AdminConfig, ClinicConfig, MongoConfig, SecurityConfig, StoreBackend, TelemetryConfig,
};
use clinic_service::services::InMemoryStore;
use clinic_service::startup::{build_router, AppState, Application};
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const ADMIN_USER: &str = "frontdesk";
pub const ADMIN_PASSWORD: &str = "correct-horse";
pub const SESSION_TOKEN: &str = "test-session-token";
pub const COOKIE_NAME: &str = "admin_session";

pub fn test_config(store: StoreBackend, protect_records: bool) -> ClinicConfig {
    ClinicConfig {
        common: CoreConfig { port: 0 },
        store,
        mongodb: MongoConfig {
            uri: std::env::var("TEST_MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database: format!("clinic_test_{}", uuid::Uuid::new_v4().simple()),
        },
        admin: AdminConfig {
            user_id: ADMIN_USER.to_string(),
            password: Secret::new(ADMIN_PASSWORD.to_string()),
            session_token: Secret::new(SESSION_TOKEN.to_string()),
            cookie_name: COOKIE_NAME.to_string(),
            session_ttl_secs: 3600,
            secure_cookie: false,
            protect_records,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            login_attempts_per_minute: 3,
            trust_forwarded_for: true,
        },
        telemetry: TelemetryConfig {
            log_level: "warn".to_string(),
            otlp_endpoint: None,
        },
    }
}

/// Router over a fresh in-memory store.
pub fn memory_app(protect_records: bool) -> Router {
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(
        test_config(StoreBackend::Memory, protect_records),
        store.clone(),
        store,
    );
    build_router(state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `Set-Cookie` header for the admin session, if the response carried one.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{}=", COOKIE_NAME)))
            .map(str::to_string)
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

pub fn patient_body(name: &str) -> Value {
    json!({
        "name": name,
        "age": 45,
        "email": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        "phno": "9876543210",
        "address": "22 Hill View Road",
        "sex": "female",
        "medicalConcern": ["Back pain"]
    })
}

/// Creates a patient and returns its id.
pub async fn create_patient(app: &Router, name: &str) -> String {
    let res = send(
        app,
        json_request(Method::POST, "/api/userDetails", &patient_body(name)),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    res.body["user"]["_id"].as_str().unwrap().to_string()
}

pub fn prescription(tablets: &str) -> Value {
    json!({ "tablets": tablets, "dosage": "1-0-1", "duration": "5 days" })
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawns the full application against the MongoDB at `TEST_MONGODB_URI`,
    /// using a throwaway database.
    pub async fn spawn() -> Self {
        let config = test_config(StoreBackend::Mongo, false);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();

        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}
