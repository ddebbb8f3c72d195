// handlers/public/mod.rs - No credentials required
//
// Service info, health and token acquisition.

pub mod auth;
pub mod system;

pub use system::{health, root};
