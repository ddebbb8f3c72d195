// handlers/protected/users/mod.rs - Account administration (super_admin)

pub mod admin;

pub use admin::create as user_post;
pub use admin::unlock as unlock_post;
