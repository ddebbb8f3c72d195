use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::product::{
    Product, ProductImage, ProductStatus, PRODUCTS_TABLE, PRODUCT_IMAGES_TABLE,
};
use crate::database::query_builder::{bind_query_as, QueryBuilder};
use crate::filter::{ColumnValue, Filter, SortDirection, SqlValue, UpdateStatement};

/// Persistence port for the product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find(&self, filter: &Filter) -> Result<Vec<Product>, DatabaseError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<Product>, DatabaseError>;

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError>;

    /// Images ordered by `display_order`, then creation time.
    async fn images(&self, product_id: Uuid) -> Result<Vec<ProductImage>, DatabaseError>;

    async fn insert(&self, product: &Product) -> Result<Product, DatabaseError>;

    /// Writes `changes` to one row. `None` when the row does not exist.
    async fn update(&self, id: Uuid, changes: &[ColumnValue]) -> Result<Option<Product>, DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    /// Applies a quantity and the inventory status rule in one atomic step.
    /// Returns the row before and after the write.
    async fn set_inventory(&self, id: Uuid, quantity: i32) -> Result<Option<(Product, Product)>, DatabaseError>;

    /// One statement over every id; `published_at` is only filled where it is null.
    async fn bulk_update_status(&self, ids: &[Uuid], status: ProductStatus) -> Result<u64, DatabaseError>;
}

/// `ProductStore` over the Postgres `products` and `product_images` tables.
pub struct PgProductStore {
    db: DatabaseManager,
    slow_query: Option<Duration>,
}

impl PgProductStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db, slow_query: None }
    }

    pub fn with_slow_query_warning(mut self, threshold: Duration) -> Self {
        self.slow_query = Some(threshold);
        self
    }

    fn check_elapsed(&self, operation: &str, started: Instant) {
        if let Some(threshold) = self.slow_query {
            let elapsed = started.elapsed();
            if elapsed > threshold {
                warn!(operation, elapsed_ms = elapsed.as_millis() as u64, "Slow query");
            }
        }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find(&self, filter: &Filter) -> Result<Vec<Product>, DatabaseError> {
        let started = Instant::now();
        let rows = QueryBuilder::<Product>::new(filter.clone()).select_all(self.db.pool()).await?;
        self.check_elapsed("products.find", started);
        Ok(rows)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Product>, DatabaseError> {
        let filter = filter.clone().limit(1, None)?;
        QueryBuilder::<Product>::new(filter).select_optional(self.db.pool()).await
    }

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError> {
        let started = Instant::now();
        let count = QueryBuilder::<Product>::new(filter.clone()).count(self.db.pool()).await?;
        self.check_elapsed("products.count", started);
        Ok(count)
    }

    async fn images(&self, product_id: Uuid) -> Result<Vec<ProductImage>, DatabaseError> {
        let filter = Filter::new(PRODUCT_IMAGES_TABLE)?
            .where_eq("product_id", product_id)
            .order("display_order", SortDirection::Asc)
            .order("created_at", SortDirection::Asc);
        QueryBuilder::<ProductImage>::new(filter).select_all(self.db.pool()).await
    }

    async fn insert(&self, product: &Product) -> Result<Product, DatabaseError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                id, title, slug, description, sku, price, compare_price, currency,
                category, subcategory, tags, inventory_quantity, track_inventory,
                allow_backorder, low_stock_threshold, status, visibility, seo_title,
                seo_description, created_by, created_at, updated_at, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(&product.title)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(product.price)
        .bind(product.compare_price)
        .bind(&product.currency)
        .bind(&product.category)
        .bind(&product.subcategory)
        .bind(&product.tags)
        .bind(product.inventory_quantity)
        .bind(product.track_inventory)
        .bind(product.allow_backorder)
        .bind(product.low_stock_threshold)
        .bind(product.status.as_str())
        .bind(product.visibility.as_str())
        .bind(&product.seo_title)
        .bind(&product.seo_description)
        .bind(product.created_by)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.published_at)
        .fetch_one(self.db.pool())
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: &[ColumnValue]) -> Result<Option<Product>, DatabaseError> {
        let sql = UpdateStatement::new(PRODUCTS_TABLE)?.set_all(changes).to_sql_by_id(id)?;
        let row = bind_query_as::<Product>(&sql).fetch_optional(self.db.pool()).await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_inventory(&self, id: Uuid, quantity: i32) -> Result<Option<(Product, Product)>, DatabaseError> {
        let mut tx = self.db.pool().begin().await?;

        let before = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(before) = before else {
            return Ok(None);
        };

        let mut after = before.clone();
        after.apply_inventory(quantity, chrono::Utc::now());

        let sql = UpdateStatement::new(PRODUCTS_TABLE)?
            .set_all(&[
                ColumnValue::new("inventory_quantity", after.inventory_quantity),
                ColumnValue::new("status", after.status.as_str()),
                ColumnValue::new("published_at", SqlValue::Timestamp(after.published_at)),
                ColumnValue::new("updated_at", SqlValue::Timestamp(Some(after.updated_at))),
            ])
            .to_sql_by_id(id)?;
        let after = bind_query_as::<Product>(&sql).fetch_one(&mut *tx).await?;

        tx.commit().await?;
        Ok(Some((before, after)))
    }

    async fn bulk_update_status(&self, ids: &[Uuid], status: ProductStatus) -> Result<u64, DatabaseError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            r#"
            UPDATE products
            SET status = $1,
                updated_at = NOW(),
                published_at = CASE
                    WHEN $1 = 'active' AND published_at IS NULL THEN NOW()
                    ELSE published_at
                END
            WHERE id = ANY($2)
            "#,
        )
        .bind(status.as_str())
        .bind(ids)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }
}
