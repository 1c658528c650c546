//! The `ConfigStore` trait.
//!
//! Implemented by storage backends (`benchtop-store-csv`,
//! `benchtop-store-sqlite`). The API and CLI depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use regex_lite::RegexBuilder;

use crate::{
  Error,
  history::{ConfigHistory, HistoryEntry},
  record::{ConfigRecord, ConfigUpdate, KeyValue},
  typed::{parse_flag, parse_leading_int},
};

// ─── Error seam ──────────────────────────────────────────────────────────────

/// Backend errors expose the domain error they wrap, if any, so that callers
/// can tell "key not found" apart from "disk on fire".
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&Error> { Some(self) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a configuration store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ConfigStore: Send + Sync {
  type Error: StoreError + From<Error>;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a record by key. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<ConfigRecord>, Self::Error>> + Send + 'a;

  /// Every record, in storage order.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<ConfigRecord>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert (version 1) or revise (version + 1) a single record.
  fn set(
    &self,
    update: ConfigUpdate,
  ) -> impl Future<Output = Result<ConfigRecord, Self::Error>> + Send + '_;

  /// Apply several upserts in one write. Returns how many were applied.
  fn set_batch(
    &self,
    updates: Vec<KeyValue>,
    updated_by: String,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Drop a record entirely and return it.
  ///
  /// Fails with [`Error::NotFound`] if the key is absent.
  fn delete<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<ConfigRecord, Self::Error>> + Send + 'a;

  // ── History ───────────────────────────────────────────────────────────

  /// The current record plus its reconstructed history, newest first.
  /// Returns `None` if the key does not currently exist.
  fn history<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<ConfigHistory>, Self::Error>> + Send + 'a;

  /// Past values recovered from backup snapshots, newest first. Backends
  /// without snapshots return an empty list.
  fn backup_history<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + 'a {
    let _ = key;
    async { Ok(Vec::new()) }
  }

  // ── Provided ──────────────────────────────────────────────────────────

  /// Records whose key matches `pattern`, a case-insensitive regular
  /// expression. Linear scan in storage order.
  fn search<'a>(
    &'a self,
    pattern: &'a str,
  ) -> impl Future<Output = Result<Vec<ConfigRecord>, Self::Error>> + Send + 'a {
    async move {
      let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidPattern(e.to_string()))?;
      let records = self.list().await?;
      Ok(records.into_iter().filter(|r| re.is_match(&r.key)).collect())
    }
  }

  /// Records whose key starts with `prefix`, in storage order.
  fn by_prefix<'a>(
    &'a self,
    prefix: &'a str,
  ) -> impl Future<Output = Result<Vec<ConfigRecord>, Self::Error>> + Send + 'a {
    async move {
      let records = self.list().await?;
      Ok(records.into_iter().filter(|r| r.key.starts_with(prefix)).collect())
    }
  }

  /// Write a historical value back as a new version. This is a forward
  /// write: the version counter still increments.
  fn revert(
    &self,
    key: String,
    target_value: String,
    updated_by: String,
  ) -> impl Future<Output = Result<ConfigRecord, Self::Error>> + Send + '_ {
    self.set(ConfigUpdate::new(key, target_value, updated_by))
  }

  /// The value for `key`, or `fallback`. Read failures are logged and
  /// swallowed.
  fn get_value<'a>(
    &'a self,
    key: &'a str,
    fallback: Option<&'a str>,
  ) -> impl Future<Output = Option<String>> + Send + 'a {
    async move {
      match self.get(key).await {
        Ok(Some(record)) => Some(record.value),
        Ok(None) => fallback.map(str::to_owned),
        Err(error) => {
          tracing::warn!(key, %error, "failed to read config key");
          fallback.map(str::to_owned)
        }
      }
    }
  }

  /// The value parsed as an integer, or `fallback` (default `0`) when the
  /// key is missing, unreadable or not numeric.
  fn get_number<'a>(
    &'a self,
    key: &'a str,
    fallback: Option<i64>,
  ) -> impl Future<Output = i64> + Send + 'a {
    async move {
      let fallback = fallback.unwrap_or(0);
      self
        .get_value(key, None)
        .await
        .and_then(|v| parse_leading_int(&v))
        .unwrap_or(fallback)
    }
  }

  /// The value parsed as a flag, or `fallback` (default `false`) when the
  /// key is missing or unreadable.
  fn get_bool<'a>(
    &'a self,
    key: &'a str,
    fallback: Option<bool>,
  ) -> impl Future<Output = bool> + Send + 'a {
    async move {
      match self.get_value(key, None).await {
        Some(v) => parse_flag(&v),
        None => fallback.unwrap_or(false),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::{history::collapse_repeats, record::now, table::ConfigTable};

  /// A minimal in-memory store for exercising the provided methods.
  #[derive(Default)]
  struct MemoryStore {
    table:  Mutex<ConfigTable>,
    broken: bool,
  }

  #[derive(Debug, thiserror::Error)]
  enum MemError {
    #[error(transparent)]
    Core(#[from] Error),
    #[error("store is broken")]
    Broken,
  }

  impl StoreError for MemError {
    fn as_core(&self) -> Option<&Error> {
      match self {
        MemError::Core(e) => Some(e),
        MemError::Broken => None,
      }
    }
  }

  impl ConfigStore for MemoryStore {
    type Error = MemError;

    async fn get(&self, key: &str) -> Result<Option<ConfigRecord>, MemError> {
      if self.broken {
        return Err(MemError::Broken);
      }
      Ok(self.table.lock().unwrap().get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<ConfigRecord>, MemError> {
      Ok(self.table.lock().unwrap().clone().into_records())
    }

    async fn set(&self, update: ConfigUpdate) -> Result<ConfigRecord, MemError> {
      Ok(self.table.lock().unwrap().upsert(&update, now())?)
    }

    async fn set_batch(
      &self,
      updates: Vec<KeyValue>,
      updated_by: String,
    ) -> Result<usize, MemError> {
      let mut table = self.table.lock().unwrap();
      let at = now();
      for kv in &updates {
        table.upsert(&ConfigUpdate::new(&kv.key, &kv.value, &updated_by), at)?;
      }
      Ok(updates.len())
    }

    async fn delete(&self, key: &str) -> Result<ConfigRecord, MemError> {
      Ok(self.table.lock().unwrap().remove(key)?)
    }

    async fn history(&self, key: &str) -> Result<Option<ConfigHistory>, MemError> {
      let Some(current) = self.get(key).await? else { return Ok(None) };
      let history = collapse_repeats(vec![HistoryEntry::from(&current)]);
      Ok(Some(ConfigHistory { key: key.to_owned(), current, history }))
    }
  }

  async fn seeded() -> MemoryStore {
    let s = MemoryStore::default();
    for (k, v) in [
      ("seo.title", "Lab Essentials"),
      ("security.rateLimit.max", "100"),
      ("seo.description", "Microscopes"),
      ("features.quiz", "TRUE"),
    ] {
      s.set(ConfigUpdate::new(k, v, "seed")).await.unwrap();
    }
    s
  }

  #[tokio::test]
  async fn by_prefix_keeps_storage_order() {
    let s = seeded().await;
    let seo = s.by_prefix("seo.").await.unwrap();
    let keys: Vec<_> = seo.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["seo.title", "seo.description"]);
  }

  #[tokio::test]
  async fn search_is_case_insensitive() {
    let s = seeded().await;
    let hits = s.search("RATELIMIT").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].key, "security.rateLimit.max");
  }

  #[tokio::test]
  async fn search_rejects_invalid_pattern() {
    let s = seeded().await;
    let err = s.search("seo.(").await.unwrap_err();
    assert!(matches!(err.as_core(), Some(Error::InvalidPattern(_))));
  }

  #[tokio::test]
  async fn typed_getters() {
    let s = seeded().await;
    assert_eq!(s.get_number("security.rateLimit.max", None).await, 100);
    assert_eq!(s.get_number("seo.title", Some(5)).await, 5);
    assert_eq!(s.get_number("missing", None).await, 0);
    assert!(s.get_bool("features.quiz", None).await);
    assert!(s.get_bool("missing", Some(true)).await);
    assert!(!s.get_bool("seo.title", Some(true)).await);
    assert_eq!(
      s.get_value("missing", Some("fallback")).await.as_deref(),
      Some("fallback")
    );
    assert_eq!(s.get_value("missing", None).await, None);
  }

  #[tokio::test]
  async fn getters_swallow_backend_errors() {
    let s = MemoryStore { broken: true, ..Default::default() };
    assert_eq!(s.get_value("k", Some("fb")).await.as_deref(), Some("fb"));
    assert_eq!(s.get_number("k", Some(3)).await, 3);
    assert!(!s.get_bool("k", None).await);
  }

  #[tokio::test]
  async fn revert_is_a_forward_write() {
    let s = seeded().await;
    s.set(ConfigUpdate::new("seo.title", "New", "bob")).await.unwrap();
    let r = s
      .revert("seo.title".into(), "Lab Essentials".into(), "carol".into())
      .await
      .unwrap();
    assert_eq!(r.value, "Lab Essentials");
    assert_eq!(r.version, 3);
    assert_eq!(r.updated_by, "carol");
  }

  #[tokio::test]
  async fn default_backup_history_is_empty() {
    let s = seeded().await;
    assert!(s.backup_history("seo.title").await.unwrap().is_empty());
  }
}
