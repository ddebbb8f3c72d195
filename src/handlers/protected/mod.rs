// handlers/protected/mod.rs - Identity-aware handlers
//
// The identity middleware has already resolved the caller (or marked the request
// anonymous). Each handler applies its own role allow-list, so anonymous reads of
// public catalog records stay possible while every write needs a signed-in role.

pub mod auth;     // Session introspection and password change
pub mod products; // Catalog reads, writes, partial operations and bulk actions
pub mod users;    // Account administration
