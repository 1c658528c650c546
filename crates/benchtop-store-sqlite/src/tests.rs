//! Integration tests for `SqliteStore` against an in-memory database.

use benchtop_core::{
  record::{ConfigUpdate, KeyValue},
  store::{ConfigStore, StoreError},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn update(key: &str, value: &str, by: &str) -> ConfigUpdate {
  ConfigUpdate::new(key, value, by)
}

#[tokio::test]
async fn first_write_is_version_one_then_increments() {
  let s = store().await;

  let r1 = s.set(update("seo.title", "Lab Essentials", "alice")).await.unwrap();
  assert_eq!(r1.version, 1);

  let r2 = s
    .set(update("seo.title", "Lab Essentials Inc", "bob"))
    .await
    .unwrap();
  assert_eq!(r2.version, 2);
  assert!(r2.updated_at > r1.updated_at);

  let fetched = s.get("seo.title").await.unwrap().unwrap();
  assert_eq!(fetched, r2);
}

#[tokio::test]
async fn list_preserves_first_insertion_order() {
  let s = store().await;
  for key in ["seo.title", "security.cors", "seo.description"] {
    s.set(update(key, "v", "seed")).await.unwrap();
  }
  s.set(update("seo.title", "v2", "seed")).await.unwrap();

  let keys: Vec<_> = s.list().await.unwrap().into_iter().map(|r| r.key).collect();
  assert_eq!(keys, ["seo.title", "security.cors", "seo.description"]);

  let seo: Vec<_> = s
    .by_prefix("seo.")
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.key)
    .collect();
  assert_eq!(seo, ["seo.title", "seo.description"]);
}

#[tokio::test]
async fn expected_version_is_enforced() {
  let s = store().await;
  s.set(update("k", "a", "u")).await.unwrap();

  let err = s.set(update("k", "b", "u").expecting(3)).await.unwrap_err();
  assert!(matches!(
    err.as_core(),
    Some(benchtop_core::Error::Conflict { expected: 3, actual: 1, .. })
  ));

  let ok = s.set(update("k", "b", "u").expecting(1)).await.unwrap();
  assert_eq!(ok.version, 2);

  let err = s.set(update("fresh", "x", "u").expecting(1)).await.unwrap_err();
  assert!(matches!(
    err.as_core(),
    Some(benchtop_core::Error::Conflict { actual: 0, .. })
  ));
}

#[tokio::test]
async fn batch_applies_every_update_atomically() {
  let s = store().await;
  s.set(update("a", "0", "seed")).await.unwrap();

  let n = s
    .set_batch(
      vec![KeyValue::new("a", "1"), KeyValue::new("b", "2"), KeyValue::new("a", "3")],
      "batcher".into(),
    )
    .await
    .unwrap();
  assert_eq!(n, 3);

  let a = s.get("a").await.unwrap().unwrap();
  assert_eq!((a.value.as_str(), a.version), ("3", 3));

  let h = s.history("a").await.unwrap().unwrap();
  let values: Vec<_> = h.history.iter().map(|e| e.value.as_str()).collect();
  assert_eq!(values, ["3", "1", "0"]);
}

#[tokio::test]
async fn batch_with_invalid_key_writes_nothing() {
  let s = store().await;
  let err = s
    .set_batch(vec![KeyValue::new("ok", "1"), KeyValue::new("", "2")], "u".into())
    .await
    .unwrap_err();
  assert!(matches!(err.as_core(), Some(benchtop_core::Error::InvalidKey(_))));
  assert!(s.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_then_get_is_none() {
  let s = store().await;
  s.set(update("k", "v", "u")).await.unwrap();

  let removed = s.delete("k").await.unwrap();
  assert_eq!(removed.value, "v");
  assert!(s.get("k").await.unwrap().is_none());

  let err = s.delete("k").await.unwrap_err();
  assert!(matches!(err.as_core(), Some(benchtop_core::Error::NotFound(_))));
}

#[tokio::test]
async fn recreated_key_restarts_at_version_one() {
  let s = store().await;
  s.set(update("k", "v", "u")).await.unwrap();
  s.set(update("k", "w", "u")).await.unwrap();
  s.delete("k").await.unwrap();

  let r = s.set(update("k", "x", "u")).await.unwrap();
  assert_eq!(r.version, 1);
}

#[tokio::test]
async fn history_collapses_repeated_values() {
  let s = store().await;
  for v in ["A", "A", "B", "B", "A"] {
    s.set(update("seo.title", v, "alice")).await.unwrap();
  }
  let h = s.history("seo.title").await.unwrap().unwrap();
  let values: Vec<_> = h.history.iter().map(|e| e.value.as_str()).collect();
  assert_eq!(values, ["A", "B", "A"]);
  assert_eq!(h.history[0].version, 5);
  assert!(h.history.iter().all(|e| e.commit.is_none()));

  assert!(s.history("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_unconditional_writes_all_land() {
  let s = store().await;
  let mut handles = Vec::new();
  for i in 0..4 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.set(update("shared", &i.to_string(), "w")).await.unwrap();
    }));
  }
  for h in handles {
    h.await.unwrap();
  }
  assert_eq!(s.get("shared").await.unwrap().unwrap().version, 4);
}

#[tokio::test]
async fn file_backed_store_persists_across_reopen() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("config.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.set(update("seo.title", "Lab", "alice")).await.unwrap();
  }
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.get_value("seo.title", None).await.as_deref(), Some("Lab"));
}
