pub mod accounts;
pub mod health;
pub mod manager;
pub mod memory;
pub mod models;
pub mod products;
pub mod query_builder;
pub mod record;

pub use accounts::{AccountStore, PgAccountStore};
pub use health::HealthCheck;
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryAccountStore, MemoryHealth, MemoryProductStore};
pub use products::{PgProductStore, ProductStore};
pub use record::{FieldChange, RecordDiff};
