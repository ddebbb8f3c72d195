use axum::{
    extract::{Extension, Query, State},
    response::Response,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{CATALOG_ADMINS, CATALOG_WRITERS};
use crate::auth::{ClientInfo, Identity};
use crate::database::models::product::{CreateProductInput, Product, ProductStatus};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, RequestTimer};
use crate::services::{ProductListParams, ProductQuery};
use crate::state::AppState;
use crate::validation::ValidationErrors;

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub action: Option<String>,
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub data: Value,
}

/// GET /api/products - Paginated, filtered, sorted list
///
/// Anonymous callers always get `status=active, visibility=visible`, whatever they
/// asked for.
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ProductListParams>,
) -> Response {
    let timer = RequestTimer::start("products.list");
    let result = list(&state, &identity, params).await;
    timer.finish(&identity, result)
}

async fn list(state: &AppState, identity: &Identity, params: ProductListParams) -> ApiResult<Vec<Product>> {
    let mut query = ProductQuery::parse(params, state.page_limits())?;
    if identity.is_anonymous() {
        query.restrict_to_public();
    }

    let page = state.products.get_all(&query).await?;
    Ok(ApiResponse::success(page.data).meta("pagination", page.pagination))
}

/// POST /api/products - Create (editor, super_admin)
pub async fn post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<ClientInfo>,
    body: Result<ApiJson<CreateProductInput>, ApiError>,
) -> Response {
    let timer = RequestTimer::start("products.create");
    let result = create(&state, &identity, &client, body).await;
    timer.finish(&identity, result)
}

async fn create(
    state: &AppState,
    identity: &Identity,
    client: &ClientInfo,
    body: Result<ApiJson<CreateProductInput>, ApiError>,
) -> ApiResult<Product> {
    let user = identity.require_role(CATALOG_WRITERS)?;
    let ApiJson(body) = body?;
    let product = state.products.create(body, &client.actor(Some(user))).await?;
    Ok(ApiResponse::created(product).message("Product created successfully"))
}

/// PUT /api/products - Bulk action (super_admin)
///
/// ```json
/// { "action": "updateStatus", "ids": ["..."], "data": { "status": "archived" } }
/// { "action": "delete", "ids": ["..."] }
/// ```
pub async fn put(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<ClientInfo>,
    body: Result<ApiJson<BulkRequest>, ApiError>,
) -> Response {
    let timer = RequestTimer::start("products.bulk");
    let result = bulk(&state, &identity, &client, body).await;
    timer.finish(&identity, result)
}

async fn bulk(
    state: &AppState,
    identity: &Identity,
    client: &ClientInfo,
    body: Result<ApiJson<BulkRequest>, ApiError>,
) -> ApiResult<Value> {
    let user = identity.require_role(CATALOG_ADMINS)?;
    let ApiJson(body) = body?;
    let actor = client.actor(Some(user));

    let action = body.action.unwrap_or_default();
    let ids = parse_ids(body.ids)?;

    let affected = match action.as_str() {
        "updateStatus" => {
            let status = bulk_status(&body.data)?;
            state.products.bulk_update_status(&ids, status, &actor).await?
        }
        "delete" => state.products.bulk_delete(&ids, &actor).await?,
        "" => return Err(ValidationErrors::single("action", "Action is required").into()),
        other => return Err(ApiError::unsupported_operation(format!("Unsupported bulk action '{}'", other))),
    };

    Ok(ApiResponse::success(json!({
        "action": action,
        "requested": ids.len(),
        "affected": affected,
    })))
}

fn parse_ids(raw: Option<Vec<String>>) -> Result<Vec<Uuid>, ValidationErrors> {
    let raw = raw.unwrap_or_default();
    if raw.is_empty() {
        return Err(ValidationErrors::single("ids", "At least one id is required"));
    }

    let mut ids = Vec::with_capacity(raw.len());
    for value in &raw {
        match Uuid::parse_str(value) {
            Ok(id) => ids.push(id),
            Err(_) => return Err(ValidationErrors::single("ids", format!("Invalid id '{}'", value))),
        }
    }
    Ok(ids)
}

fn bulk_status(data: &Value) -> Result<ProductStatus, ValidationErrors> {
    match data.get("status").and_then(Value::as_str) {
        Some(raw) => raw.parse().map_err(|_| ValidationErrors::single("status", format!("Invalid status '{}'", raw))),
        None => Err(ValidationErrors::single("status", "Status is required")),
    }
}
