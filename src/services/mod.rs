pub mod product_query;
pub mod product_service;

pub use product_query::{PageLimits, Pagination, ProductListParams, ProductQuery};
pub use product_service::{ProductError, ProductPage, ProductService};
