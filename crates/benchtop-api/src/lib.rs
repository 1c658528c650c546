//! JSON admin API for benchtop configuration.
//!
//! Exposes an axum [`Router`] backed by any
//! [`benchtop_core::store::ConfigStore`]. Reads are public; every write
//! requires an admin token (see [`auth`]). TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", benchtop_api::api_router(store.clone(), auth))
//! ```
//!
//! The client address used by the IP allow-list falls back to the socket
//! peer, which is only visible when served with
//! `into_make_service_with_connect_info::<SocketAddr>()`.

pub mod auth;
pub mod config;
pub mod error;
pub mod etag;
pub mod history;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use benchtop_core::store::ConfigStore;

pub use auth::{Admin, AuthConfig};
pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState<S: ConfigStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, auth: Arc<AuthConfig>) -> Router<()>
where
  S: ConfigStore + Clone + 'static,
{
  Router::new()
    .route(
      "/config",
      get(config::get::<S>)
        .put(config::put::<S>)
        .delete(config::delete::<S>),
    )
    .route("/config/batch", post(config::batch::<S>))
    // History
    .route("/config/history", get(history::history::<S>))
    .route("/config/history/backups", get(history::backups::<S>))
    .route("/config/revert", post(history::revert::<S>))
    .with_state(ApiState { store, auth })
}
