use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put, MethodRouter},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{ClinicConfig, StoreBackend};
use crate::handlers;
use crate::middleware::admin_session_middleware;
use crate::services::{InMemoryStore, MongoStore, PatientStore, ReviewStore};
use crate::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: ClinicConfig,
    pub patients: Arc<dyn PatientStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub login_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(
        config: ClinicConfig,
        patients: Arc<dyn PatientStore>,
        reviews: Arc<dyn ReviewStore>,
    ) -> Self {
        let login_rate_limiter = create_ip_rate_limiter(
            config.security.login_attempts_per_minute,
            60,
            config.security.trust_forwarded_for,
        );
        Self {
            config,
            patients,
            reviews,
            login_rate_limiter,
        }
    }
}

/// Applies the admin session guard when record protection is configured.
fn admin_only(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    if state.config.admin.protect_records {
        route.route_layer(from_fn_with_state(state.clone(), admin_session_middleware))
    } else {
        route
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route("/adminlogin", post(handlers::admin_login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let complete = || admin_only(&state, put(handlers::complete_patient));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()))
        .route(
            "/api/userDetails",
            admin_only(&state, get(handlers::list_patients)).post(handlers::create_patient),
        )
        .route(
            "/api/userDetails/:id",
            admin_only(
                &state,
                get(handlers::get_patient).put(handlers::update_patient),
            ),
        )
        .route("/api/userDetail/:id/complete", complete())
        .route("/api/userDetails/:id/complete", complete())
        .route("/api/review", post(handlers::create_review))
        .route("/api/reviews", get(handlers::list_reviews))
        .merge(login_route)
        .route("/adminsignin", get(handlers::admin_session_status))
        .route("/adminlogout", post(handlers::admin_logout))
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}

async fn connect_stores(
    config: &ClinicConfig,
) -> Result<(Arc<dyn PatientStore>, Arc<dyn ReviewStore>), AppError> {
    match config.store {
        StoreBackend::Mongo => {
            let store = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    e
                })?;
            store.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            let store = Arc::new(store);
            Ok((store.clone(), store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; records are lost on restart");
            let store = Arc::new(InMemoryStore::new());
            Ok((store.clone(), store))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

pub struct Application {
    port: u16,
    server: Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>,
}

impl Application {
    pub async fn build(config: ClinicConfig) -> Result<Self, AppError> {
        let (patients, reviews) = connect_stores(&config).await?;
        let state = AppState::new(config.clone(), patients, reviews);
        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
