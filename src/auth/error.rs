use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is temporarily locked")]
    AccountLocked,

    #[error("Account is inactive")]
    ProfileInactive,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        AuthError::Validation(errors)
    }
}
