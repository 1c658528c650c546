//! Handlers for history and revert endpoints.
//!
//! | Method | Path                       | Notes |
//! |--------|----------------------------|-------|
//! | `GET`  | `/config/history`          | `?key=`; current value plus collapsed history |
//! | `GET`  | `/config/history/backups`  | `?key=`; values found in backup snapshots |
//! | `POST` | `/config/revert`           | Body: `{"key","value","updated_by"?}`; requires [`Admin`] |

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
};
use benchtop_core::{
  history::{ConfigHistory, HistoryEntry},
  store::ConfigStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  ApiState,
  auth::Admin,
  config::{attribution, stringify},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct KeyParams {
  pub key: Option<String>,
}

fn required_key(params: Result<Query<KeyParams>, QueryRejection>) -> Result<String, ApiError> {
  let Query(params) = params?;
  params
    .key
    .filter(|k| !k.is_empty())
    .ok_or_else(|| ApiError::BadRequest("Missing required parameter: key".into()))
}

/// `GET /config/history?key=`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<KeyParams>, QueryRejection>,
) -> Result<Json<ConfigHistory>, ApiError>
where
  S: ConfigStore + Clone + 'static,
{
  let key = required_key(params)?;
  let history = state
    .store
    .history(&key)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound("Configuration key not found".into()))?;
  Ok(Json(history))
}

/// `GET /config/history/backups?key=`
pub async fn backups<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<KeyParams>, QueryRejection>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError>
where
  S: ConfigStore + Clone + 'static,
{
  let key = required_key(params)?;
  let entries = state
    .store
    .backup_history(&key)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct RevertBody {
  pub key:        Option<String>,
  pub value:      Option<Value>,
  pub updated_by: Option<String>,
}

/// `POST /config/revert`: write a historical value back as a new version.
pub async fn revert<S>(
  admin: Admin,
  State(state): State<ApiState<S>>,
  body: Result<Json<RevertBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
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

  let written = state
    .store
    .revert(key, stringify(value), updated_by)
    .await
    .map_err(ApiError::from_store)?;

  Ok(Json(json!({
    "message": "Configuration reverted successfully",
    "key": written.key,
    "value": written.value,
    "updated_by": written.updated_by,
    "version": written.version,
  })))
}
