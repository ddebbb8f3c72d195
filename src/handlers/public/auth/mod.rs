// handlers/public/auth/mod.rs - Token acquisition

pub mod login; // POST /auth/login - verify credentials, issue token and session cookie

pub use login::login_post;
