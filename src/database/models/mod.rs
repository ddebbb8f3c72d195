pub mod account;
pub mod audit_log;
pub mod product;

pub use account::{Account, CreateUserInput, NewAccount, Profile, UserSummary};
pub use audit_log::{AuditAction, AuditActor, AuditEvent};
pub use product::{
    CreateProductInput, NewProduct, Product, ProductImage, ProductPatch, ProductStatus, ProductVisibility,
    ProductWithImages, UpdateProductInput,
};
