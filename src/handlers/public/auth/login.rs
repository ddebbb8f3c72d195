use axum::{
    extract::{Extension, State},
    http::{header::SET_COOKIE, HeaderValue},
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthenticatedUser, ClientInfo, Identity, IssuedToken, LoginOutcome};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, RequestTimer};
use crate::state::AppState;
use crate::validation::ValidationErrors;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthenticatedUser,
}

/**
 * POST /auth/login - Authenticate and receive a session token
 *
 * Input: `{ "email": "string", "password": "string" }`
 *
 * Returns the token, its expiry and the signed-in identity, and sets the same
 * token as an HttpOnly session cookie for browser clients. Unknown email, wrong
 * password and a locked account all produce the same 401.
 */
pub async fn login_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<ClientInfo>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Response {
    let timer = RequestTimer::start("auth.login");

    let result = login(&state, &client, body).await;
    let cookie = result.as_ref().ok().map(|outcome| session_cookie(&state, &outcome.token));

    let mut response = timer.finish(
        &identity,
        result.map(|outcome| {
            ApiResponse::success(LoginResponse {
                token: outcome.token.token,
                expires_at: outcome.token.expires_at,
                user: outcome.user,
            })
        }),
    );

    if let Some(cookie) = cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Failed to build session cookie: {}", e),
        }
    }
    response
}

async fn login(state: &AppState, client: &ClientInfo, body: LoginRequest) -> Result<LoginOutcome, ApiError> {
    let mut errors = ValidationErrors::new();
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    }
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result(())?;

    Ok(state.auth.login(&email, &password, client).await?)
}

fn session_cookie(state: &AppState, token: &IssuedToken) -> String {
    let max_age = state.auth.token_lifetime().num_seconds();
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        state.config.security.session_cookie_name, token.token, max_age
    );
    if state.config.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}
