use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::validation::ValidationErrors;

/// `Json<T>` whose rejections use the API error envelope.
///
/// Malformed JSON is `INVALID_JSON`. A well-formed body of the wrong shape is a
/// `VALIDATION_ERROR` keyed by the path of the offending field.
///
/// Handlers that authorize before looking at the body take
/// `Result<ApiJson<T>, ApiError>` and unwrap it after the role check.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let value = match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => value,
            Err(JsonRejection::MissingJsonContentType(_)) => {
                return Err(ApiError::invalid_json("Expected request with `Content-Type: application/json`"))
            }
            Err(e) => return Err(ApiError::invalid_json(e.body_text())),
        };

        serde_path_to_error::deserialize(value)
            .map(ApiJson)
            .map_err(|e| field_error(&e).into())
    }
}

fn field_error(err: &serde_path_to_error::Error<serde_json::Error>) -> ValidationErrors {
    let path = err.path().to_string();
    let field = if path == "." { "body".to_string() } else { path };
    ValidationErrors::single(field, err.inner().to_string())
}
