//! HTTP server wiring for benchtop.
//!
//! Loads [`ServerConfig`], picks a storage backend, and mounts the
//! [`benchtop_api`] router under `/api`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use benchtop_api::{AuthConfig, api_router};
use benchtop_core::store::ConfigStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which [`ConfigStore`] implementation backs the server.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Csv,
  Sqlite,
}

/// Runtime server configuration, deserialised from `benchtop.toml` and
/// `BENCHTOP_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub backend:               Backend,
  pub csv_path:              PathBuf,
  pub sqlite_path:           PathBuf,
  /// argon2 PHC hash of the admin token; see `--hash-token`.
  pub admin_token_hash:      Option<String>,
  pub allowed_ips:           Vec<String>,
  pub allow_local_dev:       bool,
  pub allow_unauthenticated: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "127.0.0.1".into(),
      port:                  3000,
      backend:               Backend::Csv,
      csv_path:              PathBuf::from("data/config_store/config.csv"),
      sqlite_path:           PathBuf::from("data/config_store/config.db"),
      admin_token_hash:      None,
      allowed_ips:           Vec::new(),
      allow_local_dev:       false,
      allow_unauthenticated: false,
    }
  }
}

impl ServerConfig {
  /// Load settings from an optional TOML file, then the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("BENCHTOP")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("allowed_ips"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      token_hash:            self.admin_token_hash.clone().filter(|h| !h.is_empty()),
      allowed_ips:           self.allowed_ips.clone(),
      allow_local_dev:       self.allow_local_dev,
      allow_unauthenticated: self.allow_unauthenticated,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, with request tracing.
pub fn router<S>(store: Arc<S>, auth: Arc<AuthConfig>) -> Router
where
  S: ConfigStore + Clone + 'static,
{
  Router::new()
    .nest("/api", api_router(store, auth))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
