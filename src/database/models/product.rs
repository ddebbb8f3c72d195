use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::str::FromStr;
use uuid::Uuid;

use crate::filter::{ColumnValue, SqlValue};
use crate::validation::{double_option, ValidationErrors};

pub const PRODUCTS_TABLE: &str = "products";
pub const PRODUCT_IMAGES_TABLE: &str = "product_images";

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Draft,
    Active,
    Archived,
    OutOfStock,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Active => "active",
            ProductStatus::Archived => "archived",
            ProductStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ProductStatus::Draft),
            "active" => Ok(ProductStatus::Active),
            "archived" => Ok(ProductStatus::Archived),
            "out_of_stock" => Ok(ProductStatus::OutOfStock),
            other => Err(UnknownVariant { kind: "status", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductVisibility {
    Visible,
    Hidden,
}

impl ProductVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductVisibility::Visible => "visible",
            ProductVisibility::Hidden => "hidden",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ProductVisibility::Visible => ProductVisibility::Hidden,
            ProductVisibility::Hidden => ProductVisibility::Visible,
        }
    }
}

impl FromStr for ProductVisibility {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visible" => Ok(ProductVisibility::Visible),
            "hidden" => Ok(ProductVisibility::Hidden),
            other => Err(UnknownVariant { kind: "visibility", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub currency: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tags: Vec<String>,
    pub inventory_quantity: i32,
    pub track_inventory: bool,
    pub allow_backorder: bool,
    pub low_stock_threshold: i32,
    pub status: ProductStatus,
    pub visibility: ProductVisibility,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let visibility: String = row.try_get("visibility")?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            sku: row.try_get("sku")?,
            price: row.try_get("price")?,
            compare_price: row.try_get("compare_price")?,
            currency: row.try_get("currency")?,
            category: row.try_get("category")?,
            subcategory: row.try_get("subcategory")?,
            tags: row.try_get("tags")?,
            inventory_quantity: row.try_get("inventory_quantity")?,
            track_inventory: row.try_get("track_inventory")?,
            allow_backorder: row.try_get("allow_backorder")?,
            low_stock_threshold: row.try_get("low_stock_threshold")?,
            status: status.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?,
            visibility: visibility.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "visibility".to_string(),
                source: Box::new(e),
            })?,
            seo_title: row.try_get("seo_title")?,
            seo_description: row.try_get("seo_description")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            published_at: row.try_get("published_at")?,
        })
    }
}

impl Product {
    /// Status after the inventory quantity becomes `quantity`.
    ///
    /// Zero stock on a tracked, non-backorderable product forces `out_of_stock`;
    /// any positive quantity lifts `out_of_stock` back to `active`.
    /// Zero stock on a tracked product without backorders.
    pub fn forces_out_of_stock(&self, quantity: i32) -> bool {
        quantity == 0 && self.track_inventory && !self.allow_backorder
    }

    pub fn status_for_quantity(&self, quantity: i32) -> ProductStatus {
        if self.forces_out_of_stock(quantity) {
            ProductStatus::OutOfStock
        } else if quantity > 0 && self.status == ProductStatus::OutOfStock {
            ProductStatus::Active
        } else {
            self.status
        }
    }

    /// Moves to `status`, stamping `published_at` the first time the product goes active.
    pub fn transition_to(&mut self, status: ProductStatus, now: DateTime<Utc>) {
        if status == ProductStatus::Active && self.published_at.is_none() {
            self.published_at = Some(now);
        }
        self.status = status;
    }

    /// Quantity write plus the status rule, applied together.
    pub fn apply_inventory(&mut self, quantity: i32, now: DateTime<Utc>) {
        let status = self.status_for_quantity(quantity);
        self.inventory_quantity = quantity;
        self.transition_to(status, now);
        self.updated_at = now;
    }

    pub fn is_publicly_visible(&self) -> bool {
        self.status == ProductStatus::Active && self.visibility == ProductVisibility::Visible
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Every column an update may write, with its current value.
    pub fn column_values(&self) -> Vec<ColumnValue> {
        vec![
            ColumnValue::new("title", self.title.clone()),
            ColumnValue::new("slug", self.slug.clone()),
            ColumnValue::new("description", SqlValue::Text(self.description.clone())),
            ColumnValue::new("sku", SqlValue::Text(self.sku.clone())),
            ColumnValue::new("price", SqlValue::Decimal(Some(self.price))),
            ColumnValue::new("compare_price", SqlValue::Decimal(self.compare_price)),
            ColumnValue::new("currency", self.currency.clone()),
            ColumnValue::new("category", SqlValue::Text(self.category.clone())),
            ColumnValue::new("subcategory", SqlValue::Text(self.subcategory.clone())),
            ColumnValue::new("tags", SqlValue::TextArray(self.tags.clone())),
            ColumnValue::new("inventory_quantity", self.inventory_quantity),
            ColumnValue::new("track_inventory", self.track_inventory),
            ColumnValue::new("allow_backorder", self.allow_backorder),
            ColumnValue::new("low_stock_threshold", self.low_stock_threshold),
            ColumnValue::new("status", self.status.as_str()),
            ColumnValue::new("visibility", self.visibility.as_str()),
            ColumnValue::new("seo_title", SqlValue::Text(self.seo_title.clone())),
            ColumnValue::new("seo_description", SqlValue::Text(self.seo_description.clone())),
            ColumnValue::new("updated_at", SqlValue::Timestamp(Some(self.updated_at))),
            ColumnValue::new("published_at", SqlValue::Timestamp(self.published_at)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductWithImages {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
}

// ========================================
// Input
// ========================================

/// Body of a create request. Everything is optional at the serde level so that
/// missing fields surface as field errors rather than a JSON rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProductInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub compare_price: Option<Decimal>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tags: Option<Vec<String>>,
    pub inventory_quantity: Option<i32>,
    pub track_inventory: Option<bool>,
    pub allow_backorder: Option<bool>,
    pub low_stock_threshold: Option<i32>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// A fully validated create request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub currency: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tags: Vec<String>,
    pub inventory_quantity: i32,
    pub track_inventory: bool,
    pub allow_backorder: bool,
    pub low_stock_threshold: i32,
    pub status: ProductStatus,
    pub visibility: ProductVisibility,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

impl CreateProductInput {
    pub fn validate(self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = self.title.map(|t| t.trim().to_string()).unwrap_or_default();
        errors.check_length("title", &title, 1, 200);

        let slug = self.slug.unwrap_or_default();
        errors.check_slug("slug", &slug);

        let price = match self.price {
            Some(price) => {
                errors.check_money("price", price);
                price
            }
            None => {
                errors.add("price", "This field is required");
                Decimal::ZERO
            }
        };

        let sku = normalize_optional(self.sku);
        if let Some(sku) = &sku {
            errors.check_length("sku", sku, 1, 100);
        }

        if let Some(compare_price) = self.compare_price {
            errors.check_money("compare_price", compare_price);
        }
        check_compare_price(&mut errors, price, self.compare_price);

        let currency = self.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        errors.check_currency("currency", &currency);

        let inventory_quantity = self.inventory_quantity.unwrap_or(0);
        errors.check_non_negative("inventory_quantity", inventory_quantity);

        let low_stock_threshold = self.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        errors.check_non_negative("low_stock_threshold", low_stock_threshold);

        let status = parse_field(&mut errors, "status", self.status.as_deref()).unwrap_or(ProductStatus::Draft);
        let visibility =
            parse_field(&mut errors, "visibility", self.visibility.as_deref()).unwrap_or(ProductVisibility::Visible);

        check_seo(&mut errors, self.seo_title.as_deref(), self.seo_description.as_deref());

        errors.into_result(NewProduct {
            title,
            slug,
            description: self.description,
            sku,
            price,
            compare_price: self.compare_price,
            currency,
            category: normalize_optional(self.category),
            subcategory: normalize_optional(self.subcategory),
            tags: normalize_tags(self.tags.unwrap_or_default()),
            inventory_quantity,
            track_inventory: self.track_inventory.unwrap_or(true),
            allow_backorder: self.allow_backorder.unwrap_or(false),
            low_stock_threshold,
            status,
            visibility,
            seo_title: self.seo_title,
            seo_description: self.seo_description,
        })
    }
}

impl NewProduct {
    pub fn into_product(self, created_by: Option<Uuid>, now: DateTime<Utc>) -> Product {
        let published_at = (self.status == ProductStatus::Active).then_some(now);
        Product {
            id: Uuid::new_v4(),
            title: self.title,
            slug: self.slug,
            description: self.description,
            sku: self.sku,
            price: self.price,
            compare_price: self.compare_price,
            currency: self.currency,
            category: self.category,
            subcategory: self.subcategory,
            tags: self.tags,
            inventory_quantity: self.inventory_quantity,
            track_inventory: self.track_inventory,
            allow_backorder: self.allow_backorder,
            low_stock_threshold: self.low_stock_threshold,
            status: self.status,
            visibility: self.visibility,
            seo_title: self.seo_title,
            seo_description: self.seo_description,
            created_by,
            created_at: now,
            updated_at: now,
            published_at,
        }
    }
}

/// Body of an update request. `created_by` and system columns are not editable and
/// are dropped silently if present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sku: Option<Option<String>>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub compare_price: Option<Option<Decimal>>,
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub subcategory: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub inventory_quantity: Option<i32>,
    pub track_inventory: Option<bool>,
    pub allow_backorder: Option<bool>,
    pub low_stock_threshold: Option<i32>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub seo_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub seo_description: Option<Option<String>>,
}

/// A validated partial update: only the supplied fields are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub sku: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub compare_price: Option<Option<Decimal>>,
    pub currency: Option<String>,
    pub category: Option<Option<String>>,
    pub subcategory: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub inventory_quantity: Option<i32>,
    pub track_inventory: Option<bool>,
    pub allow_backorder: Option<bool>,
    pub low_stock_threshold: Option<i32>,
    pub status: Option<ProductStatus>,
    pub visibility: Option<ProductVisibility>,
    pub seo_title: Option<Option<String>>,
    pub seo_description: Option<Option<String>>,
}

impl UpdateProductInput {
    pub fn validate(self) -> Result<ProductPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = self.title.map(|t| t.trim().to_string());
        if let Some(title) = &title {
            errors.check_length("title", title, 1, 200);
        }
        if let Some(slug) = &self.slug {
            errors.check_slug("slug", slug);
        }
        let sku = self.sku.map(normalize_optional);
        if let Some(Some(sku)) = &sku {
            errors.check_length("sku", sku, 1, 100);
        }
        if let Some(price) = self.price {
            errors.check_money("price", price);
        }
        if let Some(Some(compare_price)) = self.compare_price {
            errors.check_money("compare_price", compare_price);
        }
        if let Some(currency) = &self.currency {
            errors.check_currency("currency", currency);
        }
        if let Some(quantity) = self.inventory_quantity {
            errors.check_non_negative("inventory_quantity", quantity);
        }
        if let Some(threshold) = self.low_stock_threshold {
            errors.check_non_negative("low_stock_threshold", threshold);
        }
        let status = parse_field(&mut errors, "status", self.status.as_deref());
        let visibility = parse_field(&mut errors, "visibility", self.visibility.as_deref());
        check_seo(
            &mut errors,
            self.seo_title.as_ref().and_then(|v| v.as_deref()),
            self.seo_description.as_ref().and_then(|v| v.as_deref()),
        );

        errors.into_result(ProductPatch {
            title,
            slug: self.slug,
            description: self.description,
            sku,
            price: self.price,
            compare_price: self.compare_price,
            currency: self.currency,
            category: self.category.map(normalize_optional),
            subcategory: self.subcategory.map(normalize_optional),
            tags: self.tags.map(normalize_tags),
            inventory_quantity: self.inventory_quantity,
            track_inventory: self.track_inventory,
            allow_backorder: self.allow_backorder,
            low_stock_threshold: self.low_stock_threshold,
            status,
            visibility,
            seo_title: self.seo_title,
            seo_description: self.seo_description,
        })
    }
}

impl ProductPatch {
    pub fn status(status: ProductStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn visibility(visibility: ProductVisibility) -> Self {
        Self { visibility: Some(visibility), ..Default::default() }
    }

    /// Writes the supplied fields onto `product`. Status transitions and
    /// timestamps are left to the caller.
    pub fn apply_fields(&self, product: &mut Product) {
        if let Some(v) = &self.title {
            product.title = v.clone();
        }
        if let Some(v) = &self.slug {
            product.slug = v.clone();
        }
        if let Some(v) = &self.description {
            product.description = v.clone();
        }
        if let Some(v) = &self.sku {
            product.sku = v.clone();
        }
        if let Some(v) = self.price {
            product.price = v;
        }
        if let Some(v) = self.compare_price {
            product.compare_price = v;
        }
        if let Some(v) = &self.currency {
            product.currency = v.clone();
        }
        if let Some(v) = &self.category {
            product.category = v.clone();
        }
        if let Some(v) = &self.subcategory {
            product.subcategory = v.clone();
        }
        if let Some(v) = &self.tags {
            product.tags = v.clone();
        }
        if let Some(v) = self.inventory_quantity {
            product.inventory_quantity = v;
        }
        if let Some(v) = self.track_inventory {
            product.track_inventory = v;
        }
        if let Some(v) = self.allow_backorder {
            product.allow_backorder = v;
        }
        if let Some(v) = self.low_stock_threshold {
            product.low_stock_threshold = v;
        }
        if let Some(v) = self.visibility {
            product.visibility = v;
        }
        if let Some(v) = &self.seo_title {
            product.seo_title = v.clone();
        }
        if let Some(v) = &self.seo_description {
            product.seo_description = v.clone();
        }
    }
}

pub fn check_compare_price(errors: &mut ValidationErrors, price: Decimal, compare_price: Option<Decimal>) {
    if let Some(compare_price) = compare_price {
        if compare_price < price {
            errors.add("compare_price", "Compare price must be greater than or equal to price");
        }
    }
}

fn check_seo(errors: &mut ValidationErrors, title: Option<&str>, description: Option<&str>) {
    if let Some(title) = title {
        errors.check_length("seo_title", title, 0, 70);
    }
    if let Some(description) = description {
        errors.check_length("seo_description", description, 0, 160);
    }
}

fn parse_field<T: FromStr>(errors: &mut ValidationErrors, field: &str, raw: Option<&str>) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, format!("Invalid {} '{}'", field, raw));
            None
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(status: ProductStatus, quantity: i32) -> Product {
        let input: CreateProductInput =
            serde_json::from_value(json!({"title": "Hat", "slug": "hat", "price": 1000})).unwrap();
        let mut product = input.validate().unwrap().into_product(None, Utc::now());
        product.status = status;
        product.inventory_quantity = quantity;
        product
    }

    #[test]
    fn create_applies_defaults() {
        let input: CreateProductInput =
            serde_json::from_value(json!({"title": "Hat", "slug": "hat", "price": 1000})).unwrap();
        let new = input.validate().unwrap();
        assert_eq!(new.status, ProductStatus::Draft);
        assert_eq!(new.visibility, ProductVisibility::Visible);
        assert_eq!(new.currency, "USD");
        assert!(new.track_inventory);
        assert_eq!(new.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);

        let product = new.into_product(None, Utc::now());
        assert!(product.published_at.is_none());
    }

    #[test]
    fn create_reports_every_bad_field() {
        let input: CreateProductInput = serde_json::from_value(json!({
            "slug": "Bad Slug",
            "price": -1,
            "currency": "usd",
            "inventory_quantity": -3,
            "status": "published"
        }))
        .unwrap();
        let errors = input.validate().unwrap_err();
        for field in ["title", "slug", "price", "currency", "inventory_quantity", "status"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn compare_price_must_not_undercut_price() {
        let input: CreateProductInput = serde_json::from_value(json!({
            "title": "Hat", "slug": "hat", "price": "20.00", "compare_price": "15.00"
        }))
        .unwrap();
        assert!(input.validate().unwrap_err().contains("compare_price"));
    }

    #[test]
    fn active_create_stamps_published_at() {
        let input: CreateProductInput = serde_json::from_value(json!({
            "title": "Hat", "slug": "hat", "price": 10, "status": "active"
        }))
        .unwrap();
        let now = Utc::now();
        let product = input.validate().unwrap().into_product(None, now);
        assert_eq!(product.published_at, Some(now));
    }

    #[test]
    fn zero_quantity_forces_out_of_stock_when_tracked() {
        let product = sample(ProductStatus::Active, 4);
        assert_eq!(product.status_for_quantity(0), ProductStatus::OutOfStock);

        let mut untracked = sample(ProductStatus::Active, 4);
        untracked.track_inventory = false;
        assert_eq!(untracked.status_for_quantity(0), ProductStatus::Active);

        let mut backorder = sample(ProductStatus::Active, 4);
        backorder.allow_backorder = true;
        assert_eq!(backorder.status_for_quantity(0), ProductStatus::Active);
    }

    #[test]
    fn restock_lifts_out_of_stock_only() {
        assert_eq!(sample(ProductStatus::OutOfStock, 0).status_for_quantity(3), ProductStatus::Active);
        assert_eq!(sample(ProductStatus::Draft, 0).status_for_quantity(3), ProductStatus::Draft);
        assert_eq!(sample(ProductStatus::Archived, 0).status_for_quantity(3), ProductStatus::Archived);
    }

    #[test]
    fn published_at_is_never_overwritten() {
        let mut product = sample(ProductStatus::Draft, 1);
        let first = Utc::now();
        product.transition_to(ProductStatus::Active, first);
        product.transition_to(ProductStatus::Draft, first + chrono::Duration::seconds(5));
        product.transition_to(ProductStatus::Active, first + chrono::Duration::seconds(10));
        assert_eq!(product.published_at, Some(first));
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let input: UpdateProductInput =
            serde_json::from_value(json!({"sku": null, "created_by": "ignored"})).unwrap();
        let patch = input.validate().unwrap();
        assert_eq!(patch.sku, Some(None));
        assert_eq!(patch.description, None);
    }

    #[test]
    fn update_validates_only_supplied_fields() {
        let input: UpdateProductInput = serde_json::from_value(json!({"price": 5})).unwrap();
        assert!(input.validate().is_ok());

        let input: UpdateProductInput = serde_json::from_value(json!({"slug": "NOPE"})).unwrap();
        let errors = input.validate().unwrap_err();
        assert!(errors.contains("slug"));
        assert!(!errors.contains("title"));
    }
}
