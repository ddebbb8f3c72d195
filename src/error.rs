// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::auth::AuthError;
use crate::database::manager::DatabaseError;
use crate::filter::FilterError;
use crate::services::ProductError;
use crate::validation::ValidationErrors;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<BTreeMap<String, String>>,
    },
    InvalidJson(String),
    UnsupportedOperation(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::ValidationError { .. }
            | ApiError::InvalidJson(_)
            | ApiError::UnsupportedOperation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::UnsupportedOperation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
        }
    }

    /// Machine-readable code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "DUPLICATE_VALUE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Error envelope: `{success: false, error, code, details?}`
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code(),
        });
        if let ApiError::ValidationError { field_errors: Some(fields), .. } = self {
            body["details"] = json!(fields);
        }
        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<BTreeMap<String, String>>) -> Self {
        ApiError::ValidationError { message: message.into(), field_errors }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unsupported_operation(message: impl Into<String>) -> Self {
        ApiError::UnsupportedOperation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation_error("Validation failed", Some(errors.fields().clone()))
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation { constraint } => {
                tracing::warn!(constraint = %constraint, "Unique constraint violated");
                ApiError::conflict("A record with this value already exists")
            }
            DatabaseError::Filter(e) => e.into(),
            DatabaseError::ConnectionError(msg) => {
                tracing::error!("Database connection error: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            other => {
                // Log the real error but return generic message
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Validation(errors) => errors.into(),
            ProductError::Duplicate { field, .. } => {
                ApiError::conflict(format!("A product with this {} already exists", field))
            }
            ProductError::NotFound => ApiError::not_found("Product not found"),
            ProductError::Filter(e) => e.into(),
            ProductError::Database(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // Deliberately indistinguishable
            AuthError::InvalidCredentials | AuthError::AccountLocked => {
                ApiError::unauthorized("Invalid email or password")
            }
            AuthError::ProfileInactive => ApiError::unauthorized("Account is inactive"),
            AuthError::InvalidToken => ApiError::unauthorized("Invalid or expired token"),
            AuthError::AuthenticationRequired => ApiError::unauthorized("Authentication required"),
            AuthError::InsufficientPermissions => ApiError::forbidden("Insufficient permissions"),
            AuthError::Validation(errors) => errors.into(),
            AuthError::DuplicateEmail => ApiError::conflict("An account with this email already exists"),
            AuthError::UserNotFound => ApiError::not_found("User not found"),
            AuthError::Database(e) => e.into(),
            other @ (AuthError::InvalidSecret | AuthError::TokenGeneration(_) | AuthError::Hashing(_)) => {
                tracing::error!("Auth failure: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lockout_and_bad_password_share_a_response() {
        let locked = ApiError::from(AuthError::AccountLocked);
        let invalid = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(locked.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(locked.to_json(), invalid.to_json());
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let err = ApiError::from(ValidationErrors::single("slug", "bad"));
        let body = err.to_json();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["slug"], "bad");
        assert_eq!(body["success"], false);
    }

    #[test]
    fn status_table() {
        assert_eq!(ApiError::from(AuthError::AuthenticationRequired).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(AuthError::InsufficientPermissions).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(ProductError::NotFound).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(ProductError::Duplicate { field: "slug", value: "hat".into() }).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(DatabaseError::QueryError("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(DatabaseError::ConnectionError("down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::unsupported_operation("x").error_code(), "UNSUPPORTED_OPERATION");
    }

    #[test]
    fn internal_details_never_reach_the_client() {
        let body = ApiError::from(DatabaseError::QueryError("relation \"secret\" does not exist".into())).to_json();
        assert!(!body.to_string().contains("secret"));
    }
}
