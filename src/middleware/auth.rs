use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::debug;

use crate::auth::{ClientInfo, Identity};
use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the caller once per request. Credentials are taken from the first
/// extractor that yields one; no credentials means anonymous. A credential that
/// fails verification is rejected outright instead of downgrading to anonymous.
pub async fn identity_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = ClientInfo::from_parts(request.headers(), remote);

    let credential = state
        .auth
        .extractors()
        .iter()
        .find_map(|extractor| extractor.extract(request.headers()).map(|token| (extractor.name(), token)));

    let identity = match credential {
        None => Identity::Anonymous,
        Some((source, token)) => match state.auth.authenticate_token(&token).await {
            Ok(user) => {
                debug!(source, user = %user.email, "request authenticated");
                Identity::User(user)
            }
            Err(err) => {
                debug!(source, error = %err, "credential rejected");
                return ApiError::from(err).into_response();
            }
        },
    };

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(client);
    next.run(request).await
}
