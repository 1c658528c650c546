//! Admin-token extractor and standalone verifier.
//!
//! A request is admitted when its token (from `Authorization: Bearer …` or
//! `X-Admin-Token`) verifies against the configured argon2 hash and, if an
//! allow-list is set, its client IP is on it.

use std::net::{IpAddr, SocketAddr};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use benchtop_core::store::ConfigStore;
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Forwarding headers consulted for the client address, most trusted first.
const FORWARDED_HEADERS: [&str; 4] = [
  "cf-connecting-ip",
  "x-forwarded-for",
  "x-real-ip",
  "x-vercel-forwarded-for",
];

/// Admin authentication settings for this server instance.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`. `None` means
  /// no admin token has been configured.
  pub token_hash:            Option<String>,
  /// If non-empty, only these client addresses are admitted.
  pub allowed_ips:           Vec<String>,
  /// Admit loopback clients without a token.
  pub allow_local_dev:       bool,
  /// Admit everyone when no token hash is configured.
  pub allow_unauthenticated: bool,
}

/// Present in a handler means the request carried admin rights.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admin {
  /// Who the request is attributed to when no `updated_by` is supplied.
  pub user: String,
}

/// The bearer or `X-Admin-Token` token, if any.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty());

  bearer.or_else(|| {
    headers
      .get(ADMIN_TOKEN_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|t| !t.is_empty())
  })
}

/// Best guess at the caller's address: forwarding headers first, then the
/// socket peer, then loopback.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
  for name in FORWARDED_HEADERS {
    let first = headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.split(',').next())
      .map(str::trim)
      .filter(|v| !v.is_empty());
    if let Some(ip) = first {
      return ip.to_owned();
    }
  }
  peer.map_or_else(|| "127.0.0.1".to_owned(), |ip| ip.to_string())
}

fn is_loopback(ip: &str) -> bool {
  matches!(ip, "127.0.0.1" | "::1" | "localhost" | "::ffff:127.0.0.1")
}

fn token_matches(token: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    tracing::error!(target: "benchtop::auth", "configured admin token hash is not a valid PHC string");
    return false;
  };
  Argon2::default()
    .verify_password(token.as_bytes(), &parsed)
    .is_ok()
}

/// Decide whether a request with `headers` from `ip` is an admin.
///
/// On failure the error carries the human-readable rejection reason.
pub fn verify_admin(
  headers: &HeaderMap,
  ip: &str,
  config: &AuthConfig,
) -> Result<Admin, ApiError> {
  if config.allow_local_dev && is_loopback(ip) {
    return Ok(Admin { user: "localhost-dev".into() });
  }

  let Some(phc) = config.token_hash.as_deref() else {
    if config.allow_unauthenticated {
      return Ok(Admin { user: "dev-no-auth".into() });
    }
    return Err(ApiError::Unauthorized(
      "Admin authentication is not configured".into(),
    ));
  };

  match extract_token(headers) {
    None => {
      return Err(ApiError::Unauthorized(
        "Missing authentication token. Provide via Authorization: Bearer <token> \
         or X-Admin-Token header"
          .into(),
      ));
    }
    Some(token) if !token_matches(token, phc) => {
      return Err(ApiError::Unauthorized("Invalid authentication token".into()));
    }
    Some(_) => {}
  }

  if !config.allowed_ips.is_empty() && !config.allowed_ips.iter().any(|a| a == ip) {
    return Err(ApiError::Unauthorized(format!(
      "IP address {ip} is not authorized"
    )));
  }

  Ok(Admin { user: "admin".into() })
}

impl<S> FromRequestParts<ApiState<S>> for Admin
where
  S: ConfigStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let peer = parts
      .extensions
      .get::<ConnectInfo<SocketAddr>>()
      .map(|ConnectInfo(addr)| addr.ip());
    let ip = client_ip(&parts.headers, peer);
    let outcome = verify_admin(&parts.headers, &ip, &state.auth);

    match &outcome {
      Ok(admin) => tracing::info!(
        target: "benchtop::auth",
        %ip,
        method = %parts.method,
        path = %parts.uri.path(),
        user = %admin.user,
        "admin request authorized"
      ),
      Err(ApiError::Unauthorized(reason)) => tracing::warn!(
        target: "benchtop::auth",
        %ip,
        method = %parts.method,
        path = %parts.uri.path(),
        %reason,
        "admin request rejected"
      ),
      Err(_) => {}
    }
    outcome
  }
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;

  use super::*;

  fn hash(token: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(token.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn config(token: &str) -> AuthConfig {
    AuthConfig {
      token_hash: Some(hash(token)),
      ..AuthConfig::default()
    }
  }

  fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
      map.insert(*k, HeaderValue::from_str(v).unwrap());
    }
    map
  }

  fn reason(result: Result<Admin, ApiError>) -> String {
    match result {
      Err(ApiError::Unauthorized(r)) => r,
      other => panic!("expected rejection, got {other:?}"),
    }
  }

  #[test]
  fn bearer_and_admin_header_both_accepted() {
    let cfg = config("s3cret");
    let bearer = headers(&[("authorization", "Bearer s3cret")]);
    let custom = headers(&[("x-admin-token", "s3cret")]);
    assert_eq!(verify_admin(&bearer, "10.0.0.1", &cfg).unwrap().user, "admin");
    assert_eq!(verify_admin(&custom, "10.0.0.1", &cfg).unwrap().user, "admin");
  }

  #[test]
  fn wrong_token_is_rejected() {
    let cfg = config("s3cret");
    let h = headers(&[("authorization", "Bearer nope")]);
    assert_eq!(reason(verify_admin(&h, "10.0.0.1", &cfg)), "Invalid authentication token");
  }

  #[test]
  fn missing_token_is_rejected() {
    let cfg = config("s3cret");
    let r = reason(verify_admin(&HeaderMap::new(), "10.0.0.1", &cfg));
    assert!(r.starts_with("Missing authentication token. Provide via Authorization"), "{r}");
  }

  #[test]
  fn unconfigured_hash_rejects_unless_unauthenticated_allowed() {
    let mut cfg = AuthConfig::default();
    assert_eq!(
      reason(verify_admin(&HeaderMap::new(), "10.0.0.1", &cfg)),
      "Admin authentication is not configured"
    );
    cfg.allow_unauthenticated = true;
    assert_eq!(
      verify_admin(&HeaderMap::new(), "10.0.0.1", &cfg).unwrap().user,
      "dev-no-auth"
    );
  }

  #[test]
  fn local_dev_admits_loopback_only() {
    let cfg = AuthConfig {
      allow_local_dev: true,
      ..config("s3cret")
    };
    assert_eq!(
      verify_admin(&HeaderMap::new(), "127.0.0.1", &cfg).unwrap().user,
      "localhost-dev"
    );
    assert!(verify_admin(&HeaderMap::new(), "10.0.0.1", &cfg).is_err());
  }

  #[test]
  fn allow_list_applies_after_token_check() {
    let cfg = AuthConfig {
      allowed_ips: vec!["10.0.0.1".into()],
      ..config("s3cret")
    };
    let h = headers(&[("x-admin-token", "s3cret")]);
    assert!(verify_admin(&h, "10.0.0.1", &cfg).is_ok());
    assert_eq!(
      reason(verify_admin(&h, "10.0.0.2", &cfg)),
      "IP address 10.0.0.2 is not authorized"
    );
  }

  #[test]
  fn client_ip_prefers_forwarding_headers() {
    let peer = Some("192.168.1.9".parse().unwrap());
    let h = headers(&[
      ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
      ("x-real-ip", "198.51.100.2"),
    ]);
    assert_eq!(client_ip(&h, peer), "203.0.113.7");

    let h = headers(&[("cf-connecting-ip", "198.51.100.3"), ("x-real-ip", "x")]);
    assert_eq!(client_ip(&h, peer), "198.51.100.3");

    assert_eq!(client_ip(&HeaderMap::new(), peer), "192.168.1.9");
    assert_eq!(client_ip(&HeaderMap::new(), None), "127.0.0.1");
  }
}
