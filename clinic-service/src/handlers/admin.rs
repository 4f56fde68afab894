use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use secrecy::ExposeSecret;
use service_core::{error::AppError, extract::ValidatedJson};
use subtle::ConstantTimeEq;

use crate::{
    config::AdminConfig,
    dtos::{
        admin::{AdminLoginRequest, SessionStatus},
        MessageResponse,
    },
    middleware::has_admin_session,
    services::metrics,
    AppState,
};

fn credentials_match(req: &AdminLoginRequest, admin: &AdminConfig) -> bool {
    let user_ok = req.user_id.as_bytes().ct_eq(admin.user_id.as_bytes());
    let password_ok = req
        .password
        .as_bytes()
        .ct_eq(admin.password.expose_secret().as_bytes());
    (user_ok & password_ok).into()
}

fn session_cookie(admin: &AdminConfig) -> Cookie<'static> {
    Cookie::build((
        admin.cookie_name.clone(),
        admin.session_token.expose_secret().clone(),
    ))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(admin.secure_cookie)
    .max_age(time::Duration::seconds(admin.session_ttl_secs))
    .build()
}

/// Admin login
#[utoipa::path(
    post,
    path = "/adminlogin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Login successful; sets the admin session cookie", body = MessageResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
        (status = 429, description = "Too many login attempts", body = MessageResponse)
    ),
    tag = "Admin"
)]
#[tracing::instrument(skip_all)]
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<AdminLoginRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    let admin = &state.config.admin;

    if !credentials_match(&req, admin) {
        metrics::record_admin_login(false);
        tracing::warn!(user_id = %req.user_id, "Failed admin login attempt");
        return Err(AppError::Unauthorized(anyhow::anyhow!("Invalid credentials")));
    }

    metrics::record_admin_login(true);
    tracing::info!("Admin logged in");

    Ok((
        jar.add(session_cookie(admin)),
        Json(MessageResponse::new("Login successful")),
    ))
}

/// Report whether the request carries a valid admin session
#[utoipa::path(
    get,
    path = "/adminsignin",
    responses(
        (status = 200, description = "Session is valid", body = SessionStatus),
        (status = 401, description = "No valid session", body = SessionStatus)
    ),
    tag = "Admin",
    security((), ("admin_session" = []))
)]
pub async fn admin_session_status(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (StatusCode, Json<SessionStatus>) {
    let is_auth = has_admin_session(&jar, &state.config.admin);
    let status = if is_auth {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(SessionStatus { is_auth }))
}

/// Clear the admin session cookie
#[utoipa::path(
    post,
    path = "/adminlogout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    tag = "Admin"
)]
pub async fn admin_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let removal = Cookie::build(state.config.admin.cookie_name.clone()).path("/");
    (jar.remove(removal), Json(MessageResponse::new("Logged out")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn admin() -> AdminConfig {
        AdminConfig {
            user_id: "doctor".into(),
            password: Secret::new("hunter2".into()),
            session_token: Secret::new("token-value".into()),
            cookie_name: "admin_session".into(),
            session_ttl_secs: 3600,
            secure_cookie: true,
            protect_records: false,
        }
    }

    fn login(user_id: &str, password: &str) -> AdminLoginRequest {
        AdminLoginRequest {
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    #[test]
    fn both_fields_must_match() {
        let admin = admin();
        assert!(credentials_match(&login("doctor", "hunter2"), &admin));
        assert!(!credentials_match(&login("doctor", "hunter3"), &admin));
        assert!(!credentials_match(&login("nurse", "hunter2"), &admin));
        assert!(!credentials_match(&login("", ""), &admin));
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie(&admin());
        assert_eq!(cookie.name(), "admin_session");
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }
}
