use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use roadgraph_core::Error;
use serde_json::json;
use tracing::error;

/// Failure of a request, rendered as `{"error": ...}`
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Core(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(Error::UnknownNode(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(Error::NoPath { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Core(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Core(err) => err.to_string(),
            ApiError::Internal(msg) => msg,
        };
        if status.is_server_error() {
            error!("{message}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
