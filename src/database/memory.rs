//! In-process stores. They evaluate the same `Filter` conditions the Postgres
//! stores compile to SQL, against the serialized form of each row, comparing
//! each column by its SQL type so results match either backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::accounts::AccountStore;
use crate::database::health::HealthCheck;
use crate::database::manager::DatabaseError;
use crate::database::models::account::{Account, NewAccount, Profile};
use crate::database::models::product::{Product, ProductImage, ProductStatus};
use crate::database::products::ProductStore;
use crate::filter::filter_order::TIEBREAK_COLUMN;
use crate::filter::{
    unescape_contains_pattern, ColumnValue, Condition, Filter, FilterError, FilterOp, FilterOrderInfo, Operand,
    Predicate, SortDirection, SqlValue,
};

// ========================================
// Condition evaluation
// ========================================

type Row = Map<String, Value>;

fn to_row<T: serde::Serialize>(value: &T) -> Result<Row, DatabaseError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DatabaseError::QueryError("row did not serialize to an object".to_string())),
        Err(e) => Err(DatabaseError::QueryError(e.to_string())),
    }
}

fn sql_to_json(value: &SqlValue) -> Value {
    match value {
        SqlValue::Bool(v) => Value::Bool(*v),
        SqlValue::Int(v) => Value::from(*v),
        SqlValue::BigInt(v) => Value::from(*v),
        SqlValue::Decimal(v) => v.map_or(Value::Null, |d| Value::String(d.to_string())),
        SqlValue::Text(v) => v.clone().map_or(Value::Null, Value::String),
        SqlValue::TextArray(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
        SqlValue::Uuid(v) => v.map_or(Value::Null, |u| Value::String(u.to_string())),
        SqlValue::UuidArray(v) => Value::Array(v.iter().map(|u| Value::String(u.to_string())).collect()),
        SqlValue::Timestamp(v) => v.map_or(Value::Null, |t| Value::String(t.to_rfc3339())),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// SQL type of a column, as far as ordering is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Timestamp,
    Text,
}

type ColumnTypes = fn(&str) -> ColumnKind;

fn product_column_kind(column: &str) -> ColumnKind {
    match column {
        "price" | "compare_price" | "inventory_quantity" | "low_stock_threshold" => ColumnKind::Numeric,
        "created_at" | "updated_at" | "published_at" => ColumnKind::Timestamp,
        _ => ColumnKind::Text,
    }
}

/// SQL-like comparison: NULL compares as unknown, and scalars compare by the
/// column's type. A value that does not parse as that type is incomparable.
fn compare(kind: ColumnKind, left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => (a == b).then_some(Ordering::Equal),
        _ => {
            let (a, b) = (scalar_text(left)?, scalar_text(right)?);
            match kind {
                ColumnKind::Numeric => Some(a.parse::<Decimal>().ok()?.cmp(&b.parse::<Decimal>().ok()?)),
                ColumnKind::Timestamp => {
                    Some(DateTime::parse_from_rfc3339(&a).ok()?.cmp(&DateTime::parse_from_rfc3339(&b).ok()?))
                }
                ColumnKind::Text => Some(a.cmp(&b)),
            }
        }
    }
}

fn column<'a>(row: &'a Row, name: &str) -> Result<&'a Value, FilterError> {
    row.get(name).ok_or_else(|| FilterError::InvalidColumn(name.to_string()))
}

fn eval_predicate(predicate: &Predicate, row: &Row, types: ColumnTypes) -> Result<bool, FilterError> {
    let left = column(row, &predicate.column)?;

    let right = match (&predicate.op, &predicate.operand) {
        (FilterOp::IsNull, _) => return Ok(left.is_null()),
        (FilterOp::NotNull, _) => return Ok(!left.is_null()),
        (_, Operand::None) => {
            return Err(FilterError::InvalidOperatorData(format!(
                "operator {:?} on '{}' requires an operand",
                predicate.op, predicate.column
            )))
        }
        (_, Operand::Value(value)) => sql_to_json(value),
        (_, Operand::Column(other)) => column(row, other)?.clone(),
    };

    let kind = types(&predicate.column);
    let ordering = compare(kind, left, &right);
    Ok(match predicate.op {
        FilterOp::Eq => ordering == Some(Ordering::Equal),
        FilterOp::Neq => matches!(ordering, Some(Ordering::Less | Ordering::Greater)),
        FilterOp::Gt => ordering == Some(Ordering::Greater),
        FilterOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => ordering == Some(Ordering::Less),
        FilterOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        FilterOp::ILike => match (left.as_str(), right.as_str()) {
            (Some(text), Some(pattern)) => text
                .to_lowercase()
                .contains(&unescape_contains_pattern(pattern).to_lowercase()),
            _ => false,
        },
        FilterOp::In => match &right {
            Value::Array(items) => items.iter().any(|item| compare(kind, left, item) == Some(Ordering::Equal)),
            _ => {
                return Err(FilterError::InvalidOperatorData(format!(
                    "IN on '{}' requires an array value",
                    predicate.column
                )))
            }
        },
        FilterOp::IsNull | FilterOp::NotNull => false,
    })
}

fn eval_condition(condition: &Condition, row: &Row, types: ColumnTypes) -> Result<bool, FilterError> {
    match condition {
        Condition::Predicate(p) => eval_predicate(p, row, types),
        Condition::All(children) => {
            for child in children {
                if !eval_condition(child, row, types)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Any(children) => {
            for child in children {
                if eval_condition(child, row, types)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn matches_all(conditions: &[Condition], row: &Row, types: ColumnTypes) -> Result<bool, FilterError> {
    for condition in conditions {
        if !eval_condition(condition, row, types)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Postgres default null placement: last for ASC, first for DESC.
fn compare_for_sort(kind: ColumnKind, a: &Value, b: &Value, sort: SortDirection) -> Ordering {
    let ordering = match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(kind, a, b).unwrap_or(Ordering::Equal),
    };
    match sort {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn sort_rows<T>(rows: &mut [(Row, T)], order: &[FilterOrderInfo], types: ColumnTypes) -> Result<(), FilterError> {
    let mut order = order.to_vec();
    if !order.iter().any(|o| o.column == TIEBREAK_COLUMN) {
        order.push(FilterOrderInfo { column: TIEBREAK_COLUMN.to_string(), sort: SortDirection::Asc });
    }
    if let Some((row, _)) = rows.first() {
        for info in &order {
            column(row, &info.column)?;
        }
    }
    rows.sort_by(|(a, _), (b, _)| {
        order
            .iter()
            .map(|info| {
                compare_for_sort(
                    types(&info.column),
                    a.get(&info.column).unwrap_or(&Value::Null),
                    b.get(&info.column).unwrap_or(&Value::Null),
                    info.sort,
                )
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    Ok(())
}

/// Applies conditions, ordering and the page window of `filter` to `items`.
fn select<T: serde::Serialize + Clone>(
    items: impl Iterator<Item = T>,
    filter: &Filter,
    types: ColumnTypes,
) -> Result<Vec<T>, DatabaseError> {
    let mut rows = Vec::new();
    for item in items {
        let row = to_row(&item)?;
        if matches_all(filter.conditions(), &row, types)? {
            rows.push((row, item));
        }
    }
    sort_rows(&mut rows, filter.order_data(), types)?;

    let offset = filter.offset_value().unwrap_or(0).max(0) as usize;
    let limit = filter.limit_value().map_or(usize::MAX, |l| l.max(0) as usize);
    Ok(rows.into_iter().skip(offset).take(limit).map(|(_, item)| item).collect())
}

fn count<T: serde::Serialize>(
    items: impl Iterator<Item = T>,
    filter: &Filter,
    types: ColumnTypes,
) -> Result<i64, DatabaseError> {
    let mut total = 0;
    for item in items {
        if matches_all(filter.conditions(), &to_row(&item)?, types)? {
            total += 1;
        }
    }
    Ok(total)
}

// ========================================
// Products
// ========================================

#[derive(Default)]
struct Catalog {
    products: HashMap<Uuid, Product>,
    images: Vec<ProductImage>,
}

impl Catalog {
    fn check_unique(&self, product: &Product) -> Result<(), DatabaseError> {
        for other in self.products.values().filter(|p| p.id != product.id) {
            if other.slug == product.slug {
                return Err(DatabaseError::UniqueViolation { constraint: "products_slug_key".to_string() });
            }
            if product.sku.is_some() && other.sku == product.sku {
                return Err(DatabaseError::UniqueViolation { constraint: "products_sku_key".to_string() });
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    catalog: RwLock<Catalog>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_image(
        &self,
        product_id: Uuid,
        url: &str,
        alt_text: Option<&str>,
        display_order: i32,
    ) -> Result<ProductImage, DatabaseError> {
        let mut catalog = self.catalog.write().await;
        if !catalog.products.contains_key(&product_id) {
            return Err(DatabaseError::QueryError(format!("product {} does not exist", product_id)));
        }
        let image = ProductImage {
            id: Uuid::new_v4(),
            product_id,
            url: url.to_string(),
            alt_text: alt_text.map(str::to_string),
            display_order,
            created_at: Utc::now(),
        };
        catalog.images.push(image.clone());
        Ok(image)
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find(&self, filter: &Filter) -> Result<Vec<Product>, DatabaseError> {
        let catalog = self.catalog.read().await;
        select(catalog.products.values().cloned(), filter, product_column_kind)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Product>, DatabaseError> {
        let filter = filter.clone().limit(1, None)?;
        Ok(self.find(&filter).await?.into_iter().next())
    }

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError> {
        let catalog = self.catalog.read().await;
        count(catalog.products.values(), filter, product_column_kind)
    }

    async fn images(&self, product_id: Uuid) -> Result<Vec<ProductImage>, DatabaseError> {
        let catalog = self.catalog.read().await;
        let mut images: Vec<ProductImage> =
            catalog.images.iter().filter(|i| i.product_id == product_id).cloned().collect();
        images.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(images)
    }

    async fn insert(&self, product: &Product) -> Result<Product, DatabaseError> {
        let mut catalog = self.catalog.write().await;
        catalog.check_unique(product)?;
        catalog.products.insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn update(&self, id: Uuid, changes: &[ColumnValue]) -> Result<Option<Product>, DatabaseError> {
        if changes.is_empty() {
            return Err(FilterError::EmptyUpdate("products".to_string()).into());
        }
        let mut catalog = self.catalog.write().await;
        let Some(existing) = catalog.products.get(&id) else {
            return Ok(None);
        };

        let mut row = to_row(existing)?;
        for change in changes {
            column(&row, change.column)?;
            row.insert(change.column.to_string(), sql_to_json(&change.value));
        }
        let updated: Product =
            serde_json::from_value(Value::Object(row)).map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        catalog.check_unique(&updated)?;
        catalog.products.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut catalog = self.catalog.write().await;
        let removed = catalog.products.remove(&id).is_some();
        if removed {
            catalog.images.retain(|i| i.product_id != id);
        }
        Ok(removed)
    }

    async fn set_inventory(&self, id: Uuid, quantity: i32) -> Result<Option<(Product, Product)>, DatabaseError> {
        let mut catalog = self.catalog.write().await;
        let Some(product) = catalog.products.get_mut(&id) else {
            return Ok(None);
        };
        let before = product.clone();
        product.apply_inventory(quantity, Utc::now());
        Ok(Some((before, product.clone())))
    }

    async fn bulk_update_status(&self, ids: &[Uuid], status: ProductStatus) -> Result<u64, DatabaseError> {
        let mut catalog = self.catalog.write().await;
        let now = Utc::now();
        let mut affected = 0;
        for id in ids {
            if let Some(product) = catalog.products.get_mut(id) {
                product.transition_to(status, now);
                product.updated_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }
}

// ========================================
// Accounts
// ========================================

#[derive(Default)]
struct Directory {
    accounts: HashMap<Uuid, Account>,
    profiles: HashMap<Uuid, Profile>,
}

#[derive(Default)]
pub struct MemoryAccountStore {
    directory: RwLock<Directory>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips a profile's active flag; `false` when the profile does not exist.
    pub async fn set_profile_active(&self, id: Uuid, active: bool) -> bool {
        let mut directory = self.directory.write().await;
        match directory.profiles.get_mut(&id) {
            Some(profile) => {
                profile.is_active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let directory = self.directory.read().await;
        Ok(directory.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        Ok(self.directory.read().await.accounts.get(&id).cloned())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        Ok(self.directory.read().await.profiles.get(&id).cloned())
    }

    async fn set_login_state(
        &self,
        id: Uuid,
        login_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<bool, DatabaseError> {
        let mut directory = self.directory.write().await;
        match directory.accounts.get_mut(&id) {
            Some(account) => {
                account.login_attempts = login_attempts;
                account.locked_until = locked_until;
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let mut directory = self.directory.write().await;
        if let Some(account) = directory.accounts.get_mut(&id) {
            account.login_attempts = 0;
            account.locked_until = None;
            account.last_login_at = Some(at);
            account.updated_at = at;
        }
        Ok(())
    }

    async fn create_account(&self, account: NewAccount) -> Result<(Account, Profile), DatabaseError> {
        let mut directory = self.directory.write().await;
        if directory.accounts.values().any(|a| a.email == account.email) {
            return Err(DatabaseError::UniqueViolation { constraint: "accounts_email_key".to_string() });
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4(),
            email: account.email,
            password_hash: account.password_hash,
            email_verified: false,
            login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let profile = Profile {
            id: created.id,
            display_name: account.display_name,
            role: account.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        directory.accounts.insert(created.id, created.clone());
        directory.profiles.insert(profile.id, profile.clone());
        Ok((created, profile))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, DatabaseError> {
        let mut directory = self.directory.write().await;
        match directory.accounts.get_mut(&id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ========================================
// Health
// ========================================

pub struct MemoryHealth {
    healthy: AtomicBool,
}

impl Default for MemoryHealth {
    fn default() -> Self {
        Self { healthy: AtomicBool::new(true) }
    }
}

impl MemoryHealth {
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl HealthCheck for MemoryHealth {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        if self.healthy.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(DatabaseError::ConnectionError("memory store marked unavailable".to_string()))
        }
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
