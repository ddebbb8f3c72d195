// handlers/protected/products/mod.rs - Product catalog
//
// Reads are open to anonymous callers but narrowed to active, visible records.
// Writes need editor or super_admin; deletes and bulk actions need super_admin.

use uuid::Uuid;

use crate::auth::Role;
use crate::error::ApiError;

pub mod collection;
pub mod lookup;
pub mod record;

pub use collection::get as collection_get;
pub use collection::post as collection_post;
pub use collection::put as collection_put;
pub use lookup::low_stock as low_stock_get;
pub use lookup::slug as slug_get;
pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::patch as record_patch;
pub use record::put as record_put;

pub(crate) const CATALOG_WRITERS: &[Role] = &[Role::Editor, Role::SuperAdmin];
pub(crate) const CATALOG_ADMINS: &[Role] = &[Role::SuperAdmin];

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid product id '{}'", raw)))
}
