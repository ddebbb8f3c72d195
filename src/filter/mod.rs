pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod update;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use update::{ColumnValue, UpdateStatement};
pub use error::FilterError;

/// Identifiers are interpolated into SQL, so they must be plain `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
