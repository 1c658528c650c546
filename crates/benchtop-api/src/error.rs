//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use benchtop_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

const AUTH_HINT: &str = "Provide a valid admin token via Authorization: \
                         Bearer <token> or X-Admin-Token header";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("precondition failed")]
  PreconditionFailed,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the domain error it carries.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    use benchtop_core::Error as Core;
    match e.as_core() {
      Some(Core::NotFound(_)) => ApiError::NotFound("Key not found".into()),
      Some(Core::Conflict { .. }) => ApiError::Conflict(e.to_string()),
      Some(Core::InvalidKey(_) | Core::InvalidPattern(_)) => {
        ApiError::BadRequest(e.to_string())
      }
      None => ApiError::Store(Box::new(e)),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Unauthorized(reason) => (
        StatusCode::UNAUTHORIZED,
        json!({ "error": "Unauthorized", "reason": reason, "hint": AUTH_HINT }),
      ),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::PreconditionFailed => (
        StatusCode::PRECONDITION_FAILED,
        json!({ "error": "Precondition Failed" }),
      ),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
