use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use secrecy::ExposeSecret;
use service_core::error::AppError;
use subtle::ConstantTimeEq;

use crate::config::AdminConfig;
use crate::AppState;

/// True when the jar holds the admin cookie with the configured session value.
pub fn has_admin_session(jar: &CookieJar, admin: &AdminConfig) -> bool {
    jar.get(&admin.cookie_name)
        .map(|cookie| {
            cookie
                .value()
                .as_bytes()
                .ct_eq(admin.session_token.expose_secret().as_bytes())
                .into()
        })
        .unwrap_or(false)
}

pub async fn admin_session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if has_admin_session(&jar, &state.config.admin) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected request without admin session");
    Err(AppError::Unauthorized(anyhow::anyhow!("Unauthorized")))
}
