use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::audit::AuditSink;
use crate::database::manager::DatabaseError;
use crate::database::models::audit_log::{AuditAction, AuditActor, AuditEvent};
use crate::database::models::product::{
    check_compare_price, CreateProductInput, Product, ProductPatch, ProductStatus, ProductWithImages,
    UpdateProductInput, PRODUCTS_TABLE,
};
use crate::database::products::ProductStore;
use crate::database::record::RecordDiff;
use crate::filter::{Filter, FilterError, FilterOp, Predicate, SortDirection};
use crate::services::product_query::{Pagination, ProductQuery};
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("A product with this {field} already exists")]
    Duplicate { field: &'static str, value: String },

    #[error("Product not found")]
    NotFound,

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<ValidationErrors> for ProductError {
    fn from(errors: ValidationErrors) -> Self {
        ProductError::Validation(errors)
    }
}

impl From<DatabaseError> for ProductError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Filter(e) => ProductError::Filter(e),
            other => ProductError::Database(other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub data: Vec<Product>,
    pub pagination: Pagination,
}

/// Catalog operations: validation, uniqueness pre-checks, inventory and
/// publication rules, and the audit trail.
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    audit: Arc<dyn AuditSink>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    // ========================================
    // Reads
    // ========================================

    pub async fn get_all(&self, query: &ProductQuery) -> Result<ProductPage, ProductError> {
        let filter = query.to_filter()?;
        let total = self.store.count(&filter).await?;
        let data = self.store.find(&filter.paginate(query.page, query.limit)?).await?;

        Ok(ProductPage { data, pagination: Pagination::new(query.page, query.limit, total) })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, ProductError> {
        let filter = Filter::new(PRODUCTS_TABLE)?.where_eq("id", id);
        Ok(self.store.find_one(&filter).await?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, ProductError> {
        let filter = Filter::new(PRODUCTS_TABLE)?.where_eq("slug", slug);
        Ok(self.store.find_one(&filter).await?)
    }

    pub async fn get_by_id_with_images(&self, id: Uuid) -> Result<Option<ProductWithImages>, ProductError> {
        let Some(product) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let images = self.store.images(id).await?;
        Ok(Some(ProductWithImages { product, images }))
    }

    /// Tracked, active products at or below their threshold, most depleted first.
    pub async fn get_low_stock(&self) -> Result<Vec<Product>, ProductError> {
        let filter = Filter::new(PRODUCTS_TABLE)?
            .where_eq("track_inventory", true)
            .where_eq("status", ProductStatus::Active.as_str())
            .where_clause(Predicate::columns("inventory_quantity", FilterOp::Lte, "low_stock_threshold"))
            .order("inventory_quantity", SortDirection::Asc);
        Ok(self.store.find(&filter).await?)
    }

    // ========================================
    // Writes
    // ========================================

    pub async fn create(&self, input: CreateProductInput, actor: &AuditActor) -> Result<Product, ProductError> {
        let new = input.validate()?;

        self.ensure_unique("slug", &new.slug, None).await?;
        if let Some(sku) = &new.sku {
            self.ensure_unique("sku", sku, None).await?;
        }

        let product = new.into_product(actor.user_id, Utc::now());
        let created = self.store.insert(&product).await.map_err(|e| map_unique(e, &product))?;

        info!(product_id = %created.id, slug = %created.slug, actor = ?actor.user_id, "product created");
        self.audit.emit(
            AuditEvent::new(actor, AuditAction::Create, PRODUCTS_TABLE, Some(created.id)).with_new(created.snapshot()),
        );
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, input: UpdateProductInput, actor: &AuditActor) -> Result<Product, ProductError> {
        let patch = input.validate()?;
        self.apply_patch(id, patch, actor).await
    }

    /// Applies a validated patch: uniqueness for changed keys, merged-value
    /// checks, status rules, then writes only the columns that differ.
    pub async fn apply_patch(&self, id: Uuid, patch: ProductPatch, actor: &AuditActor) -> Result<Product, ProductError> {
        let existing = self.get_by_id(id).await?.ok_or(ProductError::NotFound)?;

        if let Some(slug) = patch.slug.as_deref().filter(|s| *s != existing.slug) {
            self.ensure_unique("slug", slug, Some(id)).await?;
        }
        if let Some(Some(sku)) = &patch.sku {
            if existing.sku.as_deref() != Some(sku.as_str()) {
                self.ensure_unique("sku", sku, Some(id)).await?;
            }
        }

        let now = Utc::now();
        let mut merged = existing.clone();
        patch.apply_fields(&mut merged);

        let mut errors = ValidationErrors::new();
        check_compare_price(&mut errors, merged.price, merged.compare_price);
        errors.into_result(())?;

        // Zero stock wins over an explicit status in the same patch.
        let next_status = match (patch.status, patch.inventory_quantity) {
            (Some(_), Some(quantity)) if merged.forces_out_of_stock(quantity) => Some(ProductStatus::OutOfStock),
            (Some(status), _) => Some(status),
            (None, Some(quantity)) => Some(merged.status_for_quantity(quantity)),
            (None, None) => None,
        };
        if let Some(status) = next_status {
            merged.transition_to(status, now);
        }
        merged.updated_at = now;

        let diff = RecordDiff::between(&existing, &merged);
        let changes = diff.select_columns(merged.column_values());
        debug!(product_id = %id, fields = ?diff.fields(), "product diff");

        let updated = self
            .store
            .update(id, &changes)
            .await
            .map_err(|e| map_unique(e, &merged))?
            .ok_or(ProductError::NotFound)?;

        info!(product_id = %id, actor = ?actor.user_id, "product updated");
        self.audit.emit(
            AuditEvent::new(actor, AuditAction::Update, PRODUCTS_TABLE, Some(id))
                .with_old(existing.snapshot())
                .with_new(updated.snapshot()),
        );
        Ok(updated)
    }

    /// `false` when there was nothing to delete; no audit event in that case.
    pub async fn delete(&self, id: Uuid, actor: &AuditActor) -> Result<bool, ProductError> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(false);
        };
        if !self.store.delete(id).await? {
            return Ok(false);
        }

        info!(product_id = %id, actor = ?actor.user_id, "product deleted");
        self.audit.emit(
            AuditEvent::new(actor, AuditAction::Delete, PRODUCTS_TABLE, Some(id)).with_old(existing.snapshot()),
        );
        Ok(true)
    }

    pub async fn update_inventory(&self, id: Uuid, quantity: i32, actor: &AuditActor) -> Result<Product, ProductError> {
        let mut errors = ValidationErrors::new();
        errors.check_non_negative("quantity", quantity);
        errors.into_result(())?;

        let (before, after) = self.store.set_inventory(id, quantity).await?.ok_or(ProductError::NotFound)?;

        info!(
            product_id = %id,
            quantity,
            from = before.status.as_str(),
            to = after.status.as_str(),
            "inventory updated"
        );
        self.audit.emit(
            AuditEvent::new(actor, AuditAction::UpdateInventory, PRODUCTS_TABLE, Some(id))
                .with_old(json!({"inventory_quantity": before.inventory_quantity, "status": before.status}))
                .with_new(json!({"inventory_quantity": after.inventory_quantity, "status": after.status})),
        );
        Ok(after)
    }

    pub async fn update_status(&self, id: Uuid, status: ProductStatus, actor: &AuditActor) -> Result<Product, ProductError> {
        self.apply_patch(id, ProductPatch::status(status), actor).await
    }

    pub async fn toggle_visibility(&self, id: Uuid, actor: &AuditActor) -> Result<Product, ProductError> {
        let existing = self.get_by_id(id).await?.ok_or(ProductError::NotFound)?;
        self.apply_patch(id, ProductPatch::visibility(existing.visibility.toggled()), actor).await
    }

    /// Single statement over every id, one audit event for the batch.
    pub async fn bulk_update_status(
        &self,
        ids: &[Uuid],
        status: ProductStatus,
        actor: &AuditActor,
    ) -> Result<u64, ProductError> {
        let ids = dedupe(ids);
        let affected = self.store.bulk_update_status(&ids, status).await?;

        info!(requested = ids.len(), affected, status = status.as_str(), "bulk status update");
        self.audit.emit(
            AuditEvent::new(actor, AuditAction::BulkUpdateStatus, PRODUCTS_TABLE, None)
                .with_new(json!({"ids": ids, "status": status, "affected": affected})),
        );
        Ok(affected)
    }

    /// Deletes each id in turn; ids that do not exist are skipped.
    pub async fn bulk_delete(&self, ids: &[Uuid], actor: &AuditActor) -> Result<u64, ProductError> {
        let mut deleted = 0;
        for id in dedupe(ids) {
            if self.delete(id, actor).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn ensure_unique(&self, field: &'static str, value: &str, exclude: Option<Uuid>) -> Result<(), ProductError> {
        let mut filter = Filter::new(PRODUCTS_TABLE)?.where_eq(field, value);
        if let Some(id) = exclude {
            filter = filter.where_clause(Predicate::new("id", FilterOp::Neq, id));
        }
        if self.store.count(&filter).await? > 0 {
            return Err(ProductError::Duplicate { field, value: value.to_string() });
        }
        Ok(())
    }
}

/// The database constraint is the backstop for a race past the pre-check.
fn map_unique(err: DatabaseError, product: &Product) -> ProductError {
    match err {
        DatabaseError::UniqueViolation { constraint } if constraint.contains("sku") => ProductError::Duplicate {
            field: "sku",
            value: product.sku.clone().unwrap_or_default(),
        },
        DatabaseError::UniqueViolation { .. } => ProductError::Duplicate { field: "slug", value: product.slug.clone() },
        other => {
            error!(product_id = %product.id, error = %other, "product write failed");
            other.into()
        }
    }
}

fn dedupe(ids: &[Uuid]) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}
