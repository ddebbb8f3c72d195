use axum::{
    extract::{Extension, Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_id, CATALOG_ADMINS, CATALOG_WRITERS};
use crate::auth::{ClientInfo, Identity};
use crate::database::models::product::{Product, ProductStatus, UpdateProductInput};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, RequestTimer};
use crate::state::AppState;
use crate::validation::ValidationErrors;

#[derive(Debug, Default, Deserialize)]
pub struct RecordParams {
    pub include_images: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    pub operation: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// GET /api/products/:id[?include_images=true]
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Query(params): Query<RecordParams>,
) -> Response {
    let timer = RequestTimer::start("products.get");
    let result = fetch(&state, &identity, &id, params).await;
    timer.finish(&identity, result)
}

async fn fetch(state: &AppState, identity: &Identity, id: &str, params: RecordParams) -> ApiResult<Value> {
    let id = parse_id(id)?;
    let include_images = matches!(params.include_images.as_deref(), Some("true") | Some("1"));

    let record = if include_images {
        state
            .products
            .get_by_id_with_images(id)
            .await?
            .filter(|found| !identity.is_anonymous() || found.product.is_publicly_visible())
            .map(|found| json!(found))
    } else {
        state
            .products
            .get_by_id(id)
            .await?
            .filter(|product| !identity.is_anonymous() || product.is_publicly_visible())
            .map(|product| json!(product))
    };

    record
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

/// PUT /api/products/:id - Partial field update (editor, super_admin)
pub async fn put(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<String>,
    body: Result<ApiJson<UpdateProductInput>, ApiError>,
) -> Response {
    let timer = RequestTimer::start("products.update");
    let result = update(&state, &identity, &client, &id, body).await;
    timer.finish(&identity, result)
}

async fn update(
    state: &AppState,
    identity: &Identity,
    client: &ClientInfo,
    id: &str,
    body: Result<ApiJson<UpdateProductInput>, ApiError>,
) -> ApiResult<Product> {
    let user = identity.require_role(CATALOG_WRITERS)?;
    let ApiJson(body) = body?;
    let id = parse_id(id)?;
    let product = state.products.update(id, body, &client.actor(Some(user))).await?;
    Ok(ApiResponse::success(product).message("Product updated successfully"))
}

/// PATCH /api/products/:id - Single named operation (editor, super_admin)
///
/// ```json
/// { "operation": "updateInventory", "data": { "quantity": 12 } }
/// { "operation": "updateStatus", "data": { "status": "archived" } }
/// { "operation": "toggleVisibility" }
/// ```
pub async fn patch(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<String>,
    body: Result<ApiJson<PatchRequest>, ApiError>,
) -> Response {
    let timer = RequestTimer::start("products.patch");
    let result = apply_operation(&state, &identity, &client, &id, body).await;
    timer.finish(&identity, result)
}

async fn apply_operation(
    state: &AppState,
    identity: &Identity,
    client: &ClientInfo,
    id: &str,
    body: Result<ApiJson<PatchRequest>, ApiError>,
) -> ApiResult<Product> {
    let user = identity.require_role(CATALOG_WRITERS)?;
    let ApiJson(body) = body?;
    let id = parse_id(id)?;
    let actor = client.actor(Some(user));

    let product = match body.operation.as_deref() {
        Some("updateInventory") => {
            let quantity = inventory_quantity(&body.data)?;
            state.products.update_inventory(id, quantity, &actor).await?
        }
        Some("updateStatus") => {
            let status = patch_status(&body.data)?;
            state.products.update_status(id, status, &actor).await?
        }
        Some("toggleVisibility") => state.products.toggle_visibility(id, &actor).await?,
        Some(other) => {
            return Err(ApiError::unsupported_operation(format!("Unsupported operation '{}'", other)));
        }
        None => return Err(ValidationErrors::single("operation", "Operation is required").into()),
    };

    Ok(ApiResponse::success(product))
}

fn inventory_quantity(data: &Value) -> Result<i32, ValidationErrors> {
    data.get("quantity")
        .and_then(Value::as_i64)
        .filter(|q| *q >= 0)
        .and_then(|q| i32::try_from(q).ok())
        .ok_or_else(|| ValidationErrors::single("quantity", "Must be a non-negative integer"))
}

fn patch_status(data: &Value) -> Result<ProductStatus, ValidationErrors> {
    match data.get("status").and_then(Value::as_str) {
        Some(raw) => raw.parse().map_err(|_| ValidationErrors::single("status", format!("Invalid status '{}'", raw))),
        None => Err(ValidationErrors::single("status", "Status is required")),
    }
}

/// DELETE /api/products/:id (super_admin)
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<String>,
) -> Response {
    let timer = RequestTimer::start("products.delete");
    let result = remove(&state, &identity, &client, &id).await;
    timer.finish(&identity, result)
}

async fn remove(state: &AppState, identity: &Identity, client: &ClientInfo, id: &str) -> ApiResult<Value> {
    let user = identity.require_role(CATALOG_ADMINS)?;
    let id = parse_id(id)?;

    if state.products.delete(id, &client.actor(Some(user))).await? {
        Ok(ApiResponse::success(json!({ "id": id, "deleted": true })).message("Product deleted successfully"))
    } else {
        Err(ApiError::not_found("Product not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_must_be_a_non_negative_integer() {
        assert_eq!(inventory_quantity(&json!({"quantity": 0})).unwrap(), 0);
        assert_eq!(inventory_quantity(&json!({"quantity": 42})).unwrap(), 42);
        assert!(inventory_quantity(&json!({"quantity": -1})).is_err());
        assert!(inventory_quantity(&json!({"quantity": 1.5})).is_err());
        assert!(inventory_quantity(&json!({"quantity": "3"})).is_err());
        assert!(inventory_quantity(&json!({})).is_err());
        assert!(inventory_quantity(&json!({"quantity": 3_000_000_000u64})).is_err());
    }

    #[test]
    fn status_must_name_a_known_state() {
        assert_eq!(patch_status(&json!({"status": "archived"})).unwrap(), ProductStatus::Archived);
        assert!(patch_status(&json!({"status": "published"})).unwrap_err().contains("status"));
        assert!(patch_status(&Value::Null).is_err());
    }
}
