use axum::{extract::Extension, response::Response};

use crate::auth::{AuthenticatedUser, Identity};
use crate::middleware::{ApiResponse, ApiResult, RequestTimer};

/// GET /api/auth/whoami - The signed-in caller
pub async fn whoami(Extension(identity): Extension<Identity>) -> Response {
    let timer = RequestTimer::start("auth.whoami");
    let result: ApiResult<AuthenticatedUser> = identity
        .require_user()
        .map(|user| ApiResponse::success(user.clone()))
        .map_err(Into::into);
    timer.finish(&identity, result)
}
