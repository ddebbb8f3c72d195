use axum::{
    extract::{Extension, Path, State},
    response::Response,
};

use super::CATALOG_WRITERS;
use crate::auth::Identity;
use crate::database::models::product::Product;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestTimer};
use crate::state::AppState;

/// GET /api/products/slug/:slug
pub async fn slug(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(slug): Path<String>,
) -> Response {
    let timer = RequestTimer::start("products.get_by_slug");
    let result = by_slug(&state, &identity, &slug).await;
    timer.finish(&identity, result)
}

async fn by_slug(state: &AppState, identity: &Identity, slug: &str) -> ApiResult<Product> {
    state
        .products
        .get_by_slug(slug)
        .await?
        .filter(|product| !identity.is_anonymous() || product.is_publicly_visible())
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

/// GET /api/products/low-stock (editor, super_admin)
pub async fn low_stock(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> Response {
    let timer = RequestTimer::start("products.low_stock");
    let result = list_low_stock(&state, &identity).await;
    timer.finish(&identity, result)
}

async fn list_low_stock(state: &AppState, identity: &Identity) -> ApiResult<Vec<Product>> {
    identity.require_role(CATALOG_WRITERS)?;
    let products = state.products.get_low_stock().await?;
    let count = products.len();
    Ok(ApiResponse::success(products).meta("count", count))
}
