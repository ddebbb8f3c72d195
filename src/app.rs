use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{protected, public};
use crate::middleware::identity_middleware;
use crate::state::AppState;

/// Full router: public routes, the product catalog and account administration,
/// all behind identity resolution.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state);

    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        // Protected (identity resolved, roles checked per handler)
        .merge(auth_routes())
        .merge(product_routes())
        .merge(user_routes())
        .layer(middleware::from_fn_with_state(state.clone(), identity_middleware))
        .layer(DefaultBodyLimit::max(body_limit));

    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new().route("/auth/login", post(auth::login_post))
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::session_whoami))
        .route("/api/auth/password", put(auth::password_put))
}

fn product_routes() -> Router<AppState> {
    use protected::products;

    Router::new()
        // Collection
        .route(
            "/api/products",
            get(products::collection_get)
                .post(products::collection_post)
                .put(products::collection_put),
        )
        // Lookups (registered before /:id so the static segments win)
        .route("/api/products/low-stock", get(products::low_stock_get))
        .route("/api/products/slug/:slug", get(products::slug_get))
        // Record
        .route(
            "/api/products/:id",
            get(products::record_get)
                .put(products::record_put)
                .patch(products::record_patch)
                .delete(products::record_delete),
        )
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users", post(users::user_post))
        .route("/api/users/:id/unlock", post(users::unlock_post))
}

fn cors_layer(state: &AppState) -> Option<CorsLayer> {
    let security = &state.config.security;
    if !security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}
