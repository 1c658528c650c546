//! Async HTTP client wrapping the benchtop admin API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use benchtop_core::{history::ConfigHistory, record::KeyValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

/// Connection settings for the benchtop API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub token:    String,
}

/// Which slice of the store a listing asks for.
#[derive(Debug, Clone)]
pub enum Listing {
  All,
  Prefix(String),
  Search(String),
}

#[derive(Deserialize)]
struct Configs {
  configs: Vec<KeyValue>,
}

/// Async HTTP client for the benchtop JSON API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.token.is_empty() {
      req
    } else {
      req.bearer_auth(&self.config.token)
    }
  }

  /// Turn a non-success response into an error carrying the server's
  /// `error` (and `reason`, for 401s) message.
  async fn checked(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body: Value = resp.json().await.unwrap_or(Value::Null);
    let message = body["reason"]
      .as_str()
      .or_else(|| body["error"].as_str())
      .unwrap_or_default();
    Err(anyhow!("{what} → {status}: {message}"))
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// `GET /api/config?key=`; `None` on 404.
  pub async fn get(&self, key: &str) -> Result<Option<KeyValue>> {
    let resp = self
      .client
      .get(self.url("/config"))
      .query(&[("key", key)])
      .send()
      .await
      .context("GET /config failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let resp = Self::checked(resp, "GET /config").await?;
    resp.json().await.map(Some).context("deserialising config value")
  }

  /// `GET /api/config?all=true|prefix=|search=`
  pub async fn list(&self, listing: &Listing) -> Result<Vec<KeyValue>> {
    let query = match listing {
      Listing::All => ("all", "true"),
      Listing::Prefix(p) => ("prefix", p.as_str()),
      Listing::Search(s) => ("search", s.as_str()),
    };
    let resp = self
      .client
      .get(self.url("/config"))
      .query(&[query])
      .send()
      .await
      .context("GET /config failed")?;
    let resp = Self::checked(resp, "GET /config").await?;
    let configs: Configs = resp.json().await.context("deserialising config listing")?;
    Ok(configs.configs)
  }

  /// `GET /api/config/history?key=`; `None` on 404.
  pub async fn history(&self, key: &str) -> Result<Option<ConfigHistory>> {
    let resp = self
      .client
      .get(self.url("/config/history"))
      .query(&[("key", key)])
      .send()
      .await
      .context("GET /config/history failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let resp = Self::checked(resp, "GET /config/history").await?;
    resp.json().await.map(Some).context("deserialising history")
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// `PUT /api/config`
  pub async fn set(
    &self,
    key: &str,
    value: &str,
    updated_by: Option<&str>,
    expected_version: Option<u64>,
  ) -> Result<Value> {
    let body = json!({
      "key": key,
      "value": value,
      "updated_by": updated_by,
      "expected_version": expected_version,
    });
    let resp = self
      .auth(self.client.put(self.url("/config")))
      .json(&body)
      .send()
      .await
      .context("PUT /config failed")?;
    let resp = Self::checked(resp, "PUT /config").await?;
    resp.json().await.context("deserialising update response")
  }

  /// `DELETE /api/config?key=`
  pub async fn delete(&self, key: &str) -> Result<Value> {
    let resp = self
      .auth(self.client.delete(self.url("/config")))
      .query(&[("key", key)])
      .send()
      .await
      .context("DELETE /config failed")?;
    let resp = Self::checked(resp, "DELETE /config").await?;
    resp.json().await.context("deserialising delete response")
  }
}
