use axum::{
    extract::{Extension, State},
    response::Response,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, RequestTimer};
use crate::state::AppState;
use crate::validation::ValidationErrors;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// PUT /api/auth/password - Change the caller's own password
pub async fn put(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Result<ApiJson<ChangePasswordRequest>, ApiError>,
) -> Response {
    let timer = RequestTimer::start("auth.password");
    let result = change_password(&state, &identity, body).await;
    timer.finish(&identity, result)
}

async fn change_password(
    state: &AppState,
    identity: &Identity,
    body: Result<ApiJson<ChangePasswordRequest>, ApiError>,
) -> ApiResult<Value> {
    let user = identity.require_user()?;
    let ApiJson(body) = body?;

    let current = body.current_password.unwrap_or_default();
    let new = body.new_password.unwrap_or_default();
    if current.is_empty() {
        return Err(ValidationErrors::single("current_password", "Current password is required").into());
    }

    state.auth.change_password(user.id, &current, &new).await?;
    Ok(ApiResponse::success(json!({ "id": user.id })).message("Password updated"))
}
