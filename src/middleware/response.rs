use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::time::Instant;
use tracing::{info, warn};

use crate::auth::Identity;
use crate::error::ApiError;

/// Wrapper for API responses that adds the success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    pub message: Option<String>,
    pub meta: Map<String, Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response with default 200 status
    pub fn success(data: T) -> Self {
        Self { data, status_code: None, message: None, meta: Map::new() }
    }

    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { status_code: Some(status_code), ..Self::success(data) }
    }

    /// 201 Created
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn meta(mut self, key: &str, value: impl Serialize) -> Self {
        self.meta.insert(key.to_string(), json!(value));
        self
    }

    fn into_parts(self) -> (StatusCode, Value) {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "success": false,
                        "error": "Failed to serialize response data",
                        "code": "INTERNAL_SERVER_ERROR"
                    }),
                );
            }
        };

        let mut envelope = json!({ "success": true, "data": data_value });
        if let Some(message) = self.message {
            envelope["message"] = Value::String(message);
        }
        if !self.meta.is_empty() {
            envelope["meta"] = Value::Object(self.meta);
        }
        (status, envelope)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let (status, body) = self.into_parts();
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Per-handler timing. Logs operation, actor, status and duration, and stamps
/// `meta.duration` on both success and error envelopes.
pub struct RequestTimer {
    operation: &'static str,
    started: Instant,
}

impl RequestTimer {
    pub fn start(operation: &'static str) -> Self {
        Self { operation, started: Instant::now() }
    }

    pub fn finish<T: Serialize>(self, identity: &Identity, result: ApiResult<T>) -> Response {
        let (status, mut body) = match result {
            Ok(response) => response.into_parts(),
            Err(err) => (err.status_code(), err.to_json()),
        };

        let elapsed = self.started.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        let actor = identity.actor_label();

        if status.is_server_error() {
            warn!(operation = self.operation, actor = %actor, status = status.as_u16(), duration_ms, "request failed");
        } else {
            info!(operation = self.operation, actor = %actor, status = status.as_u16(), duration_ms, "request completed");
        }

        if let Value::Object(envelope) = &mut body {
            let meta = envelope.entry("meta").or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(meta) = meta {
                meta.insert("duration".to_string(), Value::String(format!("{}ms", duration_ms)));
            }
        }

        (status, Json(body)).into_response()
    }
}
