use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct ClinicConfig {
    pub common: core_config::Config,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub admin: AdminConfig,
    pub security: SecurityConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// Credentials and cookie settings for the shared-secret admin session.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub user_id: String,
    pub password: Secret<String>,
    /// Value the session cookie must carry verbatim.
    pub session_token: Secret<String>,
    pub cookie_name: String,
    pub session_ttl_secs: i64,
    pub secure_cookie: bool,
    /// Require the admin cookie on the dashboard record routes.
    pub protect_records: bool,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub login_attempts_per_minute: u32,
    /// Key the login limiter on `x-forwarded-for`. Only safe behind a proxy
    /// that overwrites the header.
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl ClinicConfig {
    pub fn load() -> Result<Self, AppError> {
        // Loads .env and APP__ prefixed settings
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(ClinicConfig {
            common: common_config,
            store: get_env("STORE_BACKEND", Some("mongo"), false)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("clinic"), false)?,
            },
            admin: AdminConfig {
                user_id: get_env("ADMIN_USER_ID", Some("admin"), is_prod)?,
                password: Secret::new(get_env("ADMIN_PASSWORD", Some("admin"), is_prod)?),
                session_token: Secret::new(get_env(
                    "ADMIN_SESSION_TOKEN",
                    Some("clinic-admin-session"),
                    is_prod,
                )?),
                cookie_name: get_env("ADMIN_COOKIE_NAME", Some("admin_session"), false)?,
                session_ttl_secs: parse_env("ADMIN_SESSION_TTL_SECS", 86_400)?,
                secure_cookie: parse_env("ADMIN_SECURE_COOKIE", is_prod)?,
                protect_records: parse_env("ADMIN_PROTECT_RECORDS", false)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:5173,http://localhost:3000"),
                    false,
                )?
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
                login_attempts_per_minute: parse_env("LOGIN_ATTEMPTS_PER_MINUTE", 10)?,
                trust_forwarded_for: parse_env("TRUST_FORWARDED_FOR", false)?,
            },
            telemetry: TelemetryConfig {
                log_level: get_env("LOG_LEVEL", Some("info"), false)?,
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}
