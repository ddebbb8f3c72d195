use axum::{
    extract::{Extension, Path, State},
    response::Response,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{Identity, Role};
use crate::database::models::account::{CreateUserInput, UserSummary};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, RequestTimer};
use crate::state::AppState;

const ACCOUNT_ADMINS: &[Role] = &[Role::SuperAdmin];

/// POST /api/users - Create an account and its profile
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Result<ApiJson<CreateUserInput>, ApiError>,
) -> Response {
    let timer = RequestTimer::start("users.create");
    let result = create_user(&state, &identity, body).await;
    timer.finish(&identity, result)
}

async fn create_user(
    state: &AppState,
    identity: &Identity,
    body: Result<ApiJson<CreateUserInput>, ApiError>,
) -> ApiResult<UserSummary> {
    identity.require_role(ACCOUNT_ADMINS)?;
    let ApiJson(body) = body?;
    let user = state.auth.create_user(body).await?;
    Ok(ApiResponse::created(user).message("User created successfully"))
}

/// POST /api/users/:id/unlock - Clear failed attempts and any active lock
pub async fn unlock(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Response {
    let timer = RequestTimer::start("users.unlock");
    let result = unlock_user(&state, &identity, &id).await;
    timer.finish(&identity, result)
}

async fn unlock_user(state: &AppState, identity: &Identity, id: &str) -> ApiResult<Value> {
    identity.require_role(ACCOUNT_ADMINS)?;
    let id = Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("Invalid user id '{}'", id)))?;
    state.auth.unlock(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "unlocked": true })))
}
