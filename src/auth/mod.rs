pub mod error;
pub mod extract;
pub mod identity;
pub mod password;
pub mod role;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use extract::{BearerExtractor, CookieExtractor, CredentialExtractor};
pub use identity::{AuthenticatedUser, ClientInfo, Identity};
pub use password::PasswordHasher;
pub use role::{has_permission_level, require_role, Role};
pub use service::{AuthService, LoginOutcome};
pub use token::{Claims, IssuedToken, TokenIssuer};
