//! Handlers for `/config` endpoints.
//!
//! | Method   | Path            | Notes |
//! |----------|-----------------|-------|
//! | `GET`    | `/config`       | One of `?key=`, `?prefix=`, `?search=`, `?all=true` |
//! | `PUT`    | `/config`       | Body: `{"key","value","updated_by"?,"expected_version"?}`; honours `If-Match` |
//! | `POST`   | `/config/batch` | Body: `{"updates":[{"key","value"}],"updated_by"?}` |
//! | `DELETE` | `/config`       | `?key=`; 404 if absent |
//!
//! Reads are public; writes require [`Admin`].

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use benchtop_core::{
  record::{ConfigUpdate, KeyValue},
  store::ConfigStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  ApiState,
  auth::Admin,
  error::ApiError,
  etag::{if_match_admits, record_etag, table_etag},
};

/// Request bodies carry arbitrary JSON values; strings are stored verbatim
/// and anything else as its JSON text.
pub(crate) fn stringify(value: Value) -> String {
  match value {
    Value::String(s) => s,
    other => other.to_string(),
  }
}

/// A non-empty `updated_by`, or the authenticated admin's name.
pub(crate) fn attribution(updated_by: Option<String>, admin: &Admin) -> String {
  updated_by
    .filter(|by| !by.trim().is_empty())
    .unwrap_or_else(|| admin.user.clone())
}

// ─── Get ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct GetParams {
  pub key:    Option<String>,
  pub prefix: Option<String>,
  pub search: Option<String>,
  pub all:    Option<String>,
}

/// `GET /config?key=|prefix=|search=|all=true`
pub async fn get<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<GetParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
  S: ConfigStore + Clone + 'static,
{
  let Query(params) = params?;
  let store = &state.store;

  if let Some(key) = params.key.filter(|k| !k.is_empty()) {
    let record = store.get(&key).await.map_err(ApiError::from_store)?;
    return Ok(match record {
      Some(r) => (
        [(header::ETAG, record_etag(&r))],
        Json(json!({ "key": r.key, "value": r.value })),
      )
        .into_response(),
      None => (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Configuration key not found", "key": key })),
      )
        .into_response(),
    });
  }

  if let Some(prefix) = params.prefix {
    let records = store.by_prefix(&prefix).await.map_err(ApiError::from_store)?;
    return Ok(
      Json(json!({
        "prefix": prefix,
        "configs": records,
        "count": records.len(),
      }))
      .into_response(),
    );
  }

  if let Some(search) = params.search {
    let records = store.search(&search).await.map_err(ApiError::from_store)?;
    return Ok(
      Json(json!({
        "search": search,
        "configs": records,
        "count": records.len(),
      }))
      .into_response(),
    );
  }

  if params.all.as_deref() == Some("true") {
    let records = store.list().await.map_err(ApiError::from_store)?;
    return Ok(
      (
        [(header::ETAG, table_etag(&records))],
        Json(json!({ "configs": records, "count": records.len() })),
      )
        .into_response(),
    );
  }

  Err(ApiError::BadRequest(
    "Missing query parameter. Use: key, prefix, search, or all=true".into(),
  ))
}

// ─── Put ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PutBody {
  pub key:              Option<String>,
  pub value:            Option<Value>,
  pub updated_by:       Option<String>,
  pub expected_version: Option<u64>,
}

/// `PUT /config`
///
/// With `If-Match`, the write only lands if the current record's ETag
/// matches (412 otherwise). A body `expected_version` that no longer holds
/// yields 409.
pub async fn put<S>(
  admin: Admin,
  State(state): State<ApiState<S>>,
  headers: HeaderMap,
  body: Result<Json<PutBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ConfigStore + Clone + 'static,
{
  let Json(body) = body?;
  let (Some(key), Some(value)) = (body.key.filter(|k| !k.is_empty()), body.value)
  else {
    return Err(ApiError::BadRequest(
      "Missing required fields: key and value".into(),
    ));
  };
  let updated_by = attribution(body.updated_by, &admin);

  let mut update = ConfigUpdate::new(&key, stringify(value), &updated_by);
  update.expected_version = body.expected_version;

  if let Some(condition) = headers.get(header::IF_MATCH) {
    let condition = condition
      .to_str()
      .map_err(|_| ApiError::BadRequest("If-Match header is not valid text".into()))?;
    let current = state
      .store
      .get(&key)
      .await
      .map_err(ApiError::from_store)?
      .ok_or(ApiError::PreconditionFailed)?;
    if !if_match_admits(condition, &record_etag(&current)) {
      return Err(ApiError::PreconditionFailed);
    }
    // Pin the write to the version we just matched.
    update.expected_version = Some(current.version);
  }

  let written = state.store.set(update).await.map_err(|e| {
    // A lost race after a successful If-Match is still a failed precondition.
    match ApiError::from_store(e) {
      ApiError::Conflict(_) if headers.contains_key(header::IF_MATCH) => {
        ApiError::PreconditionFailed
      }
      other => other,
    }
  })?;

  Ok(
    (
      [(header::ETAG, record_etag(&written))],
      Json(json!({
        "message": "Configuration updated successfully",
        "key": written.key,
        "value": written.value,
        "updated_by": written.updated_by,
        "version": written.version,
      })),
    )
      .into_response(),
  )
}

// ─── Batch ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BatchItem {
  pub key:   Option<String>,
  pub value: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
  pub updates:    Option<Vec<BatchItem>>,
  pub updated_by: Option<String>,
}

/// `POST /config/batch`
pub async fn batch<S>(
  admin: Admin,
  State(state): State<ApiState<S>>,
  body: Result<Json<BatchBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ConfigStore + Clone + 'static,
{
  let Json(body) = body?;
  let items = body
    .updates
    .filter(|u| !u.is_empty())
    .ok_or_else(|| ApiError::BadRequest("Missing or empty updates array".into()))?;

  let updates = items
    .into_iter()
    .map(|item| match (item.key.filter(|k| !k.is_empty()), item.value) {
      (Some(key), Some(value)) => Some(KeyValue::new(key, stringify(value))),
      _ => None,
    })
    .collect::<Option<Vec<_>>>()
    .ok_or_else(|| {
      ApiError::BadRequest("All updates must have key and value fields".into())
    })?;

  let updated_by = attribution(body.updated_by, &admin);
  let count = state
    .store
    .set_batch(updates, updated_by.clone())
    .await
    .map_err(ApiError::from_store)?;

  Ok(Json(json!({
    "message": "Configurations updated successfully",
    "count": count,
    "updated_by": updated_by,
  })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
  pub key: Option<String>,
}

/// `DELETE /config?key=`
pub async fn delete<S>(
  admin: Admin,
  State(state): State<ApiState<S>>,
  params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ConfigStore + Clone + 'static,
{
  let Query(params) = params?;
  let key = params.key.filter(|k| !k.is_empty()).ok_or_else(|| {
    ApiError::BadRequest("Missing required query parameter: key".into())
  })?;

  state.store.delete(&key).await.map_err(ApiError::from_store)?;

  Ok(Json(json!({
    "message": "Configuration deleted successfully",
    "key": key,
    "deleted_by": admin.user,
  })))
}
