//! `benchtop config …`: commands that work on the CSV file directly.

use anyhow::{Context, Result, bail};
use benchtop_core::{
  history::HistoryEntry,
  record::{ConfigRecord, ConfigUpdate, KeyValue, timestamp},
  store::ConfigStore,
};
use benchtop_store_csv::CsvStore;

use crate::ConfigAction;

pub fn describe(r: &ConfigRecord) -> String {
  format!(
    "{}={} (v{}, by {} at {})",
    r.key,
    r.value,
    r.version,
    r.updated_by,
    timestamp::encode(&r.updated_at)
  )
}

pub fn describe_entry(e: &HistoryEntry) -> String {
  let mut line = format!(
    "v{}  {}  {}  {}",
    e.version,
    timestamp::encode(&e.updated_at),
    e.updated_by,
    e.value
  );
  if let (Some(commit), Some(message)) = (&e.commit, &e.message) {
    line.push_str(&format!("  [{commit}] {message}"));
  }
  line
}

/// Parse a `key=value` argument. The value may itself contain `=`.
pub fn parse_pair(s: &str) -> Result<KeyValue, String> {
  match s.split_once('=') {
    Some((key, value)) if !key.is_empty() => Ok(KeyValue::new(key, value)),
    _ => Err(format!("expected key=value, got {s:?}")),
  }
}

pub async fn run(store: &CsvStore, action: ConfigAction) -> Result<()> {
  match action {
    ConfigAction::Get { key, fallback } => {
      match store.get_value(&key, fallback.as_deref()).await {
        Some(value) => println!("{value}"),
        None => bail!("Configuration key not found: {key}"),
      }
    }

    ConfigAction::List { prefix, search } => {
      let records = match (prefix, search) {
        (Some(p), _) => store.by_prefix(&p).await,
        (None, Some(s)) => store.search(&s).await,
        (None, None) => store.list().await,
      }
      .context("reading config")?;
      for r in &records {
        println!("{}\t{}", r.key, r.value);
      }
      tracing::debug!(count = records.len(), "listed records");
    }

    ConfigAction::Set { key, value, by, expect_version } => {
      let mut update = ConfigUpdate::new(key, value, by);
      update.expected_version = expect_version;
      let written = store.set(update).await.context("writing config")?;
      println!("{}", describe(&written));
    }

    ConfigAction::SetBatch { pairs, by } => {
      let count = store.set_batch(pairs, by).await.context("writing config")?;
      println!("Updated {count} keys");
    }

    ConfigAction::Delete { key } => {
      let removed = store.delete(&key).await.context("deleting config")?;
      println!("Deleted {}", describe(&removed));
    }

    ConfigAction::History { key, backups } => {
      if backups {
        for entry in store.backup_history(&key).await.context("reading backups")? {
          println!("{}", describe_entry(&entry));
        }
      } else {
        let Some(history) = store.history(&key).await.context("reading history")? else {
          bail!("Configuration key not found: {key}");
        };
        println!("current: {}", describe(&history.current));
        for entry in &history.history {
          println!("{}", describe_entry(entry));
        }
      }
    }

    ConfigAction::Revert { key, value, by } => {
      let written = store.revert(key, value, by).await.context("reverting config")?;
      println!("{}", describe(&written));
    }

    ConfigAction::Snapshot => {
      let path = store.snapshot().await.context("writing snapshot")?;
      println!("{}", path.display());
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pairs_split_on_first_equals() {
    assert_eq!(parse_pair("a=b=c").unwrap(), KeyValue::new("a", "b=c"));
    assert_eq!(parse_pair("a=").unwrap(), KeyValue::new("a", ""));
    assert!(parse_pair("=x").is_err());
    assert!(parse_pair("novalue").is_err());
  }

  #[tokio::test]
  async fn commands_round_trip_through_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::open(dir.path().join("config.csv"));

    run(&store, ConfigAction::Set {
      key:            "seo.title".into(),
      value:          "Lab".into(),
      by:             "cli".into(),
      expect_version: None,
    })
    .await
    .unwrap();
    run(&store, ConfigAction::SetBatch {
      pairs: vec![KeyValue::new("seo.title", "Lab 2"), KeyValue::new("a", "1")],
      by:    "cli".into(),
    })
    .await
    .unwrap();
    assert_eq!(store.get("seo.title").await.unwrap().unwrap().version, 2);

    let stale = run(&store, ConfigAction::Set {
      key:            "seo.title".into(),
      value:          "x".into(),
      by:             "cli".into(),
      expect_version: Some(1),
    })
    .await;
    assert!(stale.is_err());

    run(&store, ConfigAction::Delete { key: "a".into() }).await.unwrap();
    assert!(run(&store, ConfigAction::Get { key: "a".into(), fallback: None }).await.is_err());
    assert!(
      run(&store, ConfigAction::Get { key: "a".into(), fallback: Some("d".into()) })
        .await
        .is_ok()
    );
  }
}
