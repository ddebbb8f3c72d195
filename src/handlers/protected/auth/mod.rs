pub mod password;
pub mod session;

// Re-export handler functions for use in routing
pub use password::put as password_put;
pub use session::whoami as session_whoami;
