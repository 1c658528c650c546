//! [`CsvStore`]: the CSV-file implementation of [`ConfigStore`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use benchtop_core::{
  history::{ConfigHistory, HistoryEntry, collapse_repeats},
  record::{self, ConfigRecord, ConfigUpdate, KeyValue},
  store::ConfigStore,
  table::ConfigTable,
};
use tokio::sync::Mutex;

use crate::{
  Error, Result, backups,
  encode::{decode_table, encode_table},
  git,
};

const DEFAULT_COMMIT_MESSAGE: &str = "Configuration update";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A configuration store backed by a single CSV file.
///
/// Writers within this process are serialised and each rewrite goes through
/// a temporary sibling file that is renamed into place. Separate processes
/// writing the same file can still race: last writer wins.
///
/// Cloning is cheap; clones share the write lock.
#[derive(Clone)]
pub struct CsvStore {
  path:  PathBuf,
  write: Arc<Mutex<()>>,
}

impl CsvStore {
  /// Point a store at `path`. The file need not exist yet; it is created on
  /// first write and reads as empty until then.
  pub fn open(path: impl AsRef<Path>) -> Self {
    Self {
      path:  path.as_ref().to_path_buf(),
      write: Arc::new(Mutex::new(())),
    }
  }

  pub fn path(&self) -> &Path { &self.path }

  fn dir(&self) -> &Path {
    match self.path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p,
      _ => Path::new("."),
    }
  }

  fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  fn backups_dir(&self) -> PathBuf { self.dir().join("backups") }

  async fn read_table(&self) -> Result<ConfigTable> {
    match tokio::fs::read(&self.path).await {
      Ok(bytes) => decode_table(&bytes),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        Ok(ConfigTable::new())
      }
      Err(e) => Err(e.into()),
    }
  }

  /// Replace the file with `table`: write a sibling temp file, then rename.
  async fn write_table(&self, table: &ConfigTable) -> Result<()> {
    let bytes = encode_table(table)?;
    tokio::fs::create_dir_all(self.dir()).await?;
    let tmp = self.dir().join(format!(
      ".{}.{}.tmp",
      self.file_name(),
      std::process::id()
    ));
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
      let _ = tokio::fs::remove_file(&tmp).await;
      return Err(e.into());
    }
    Ok(())
  }

  /// Copy the current file to `backups/config-<timestamp>.csv` and return
  /// the snapshot's path.
  pub async fn snapshot(&self) -> Result<PathBuf> {
    let _guard = self.write.lock().await;
    let table = self.read_table().await?;
    let dir = self.backups_dir();
    tokio::fs::create_dir_all(&dir).await?;
    let target = dir.join(backups::snapshot_name(record::now()));
    tokio::fs::write(&target, encode_table(&table)?).await?;
    tracing::info!(path = ?target, records = table.len(), "config snapshot written");
    Ok(target)
  }

  /// Entries for `key` from every commit that touched the file, newest first
  /// and not yet collapsed. Revisions that cannot be read are skipped.
  async fn git_history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
    let dir = self.dir();
    let file = self.file_name();
    let commits = git::log(dir, &file).await?;

    let mut entries = Vec::new();
    for commit in commits {
      tracing::debug!(
        commit = commit.short_hash(),
        author = %commit.author,
        time = commit.time,
        "reading config revision"
      );
      let table = match git::show(dir, &commit.hash, &file).await {
        Ok(bytes) => match decode_table(&bytes) {
          Ok(table) => table,
          Err(error) => {
            tracing::debug!(commit = commit.short_hash(), %error, "skipping unparsable revision");
            continue;
          }
        },
        Err(error) => {
          tracing::debug!(commit = commit.short_hash(), %error, "skipping unreadable revision");
          continue;
        }
      };

      if let Some(r) = table.get(key) {
        let message = if commit.subject.is_empty() {
          DEFAULT_COMMIT_MESSAGE.to_owned()
        } else {
          commit.subject.clone()
        };
        entries.push(HistoryEntry {
          commit: Some(commit.short_hash().to_owned()),
          message: Some(message),
          ..HistoryEntry::from(r)
        });
      }
    }
    Ok(entries)
  }
}

// ─── ConfigStore impl ────────────────────────────────────────────────────────

impl ConfigStore for CsvStore {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<ConfigRecord>> {
    Ok(self.read_table().await?.get(key).cloned())
  }

  async fn list(&self) -> Result<Vec<ConfigRecord>> {
    Ok(self.read_table().await?.into_records())
  }

  async fn set(&self, update: ConfigUpdate) -> Result<ConfigRecord> {
    let _guard = self.write.lock().await;
    let mut table = self.read_table().await?;
    let written = table.upsert(&update, record::now())?;
    self.write_table(&table).await?;
    tracing::info!(
      key = %written.key,
      version = written.version,
      updated_by = %written.updated_by,
      "config updated"
    );
    Ok(written)
  }

  async fn set_batch(
    &self,
    updates: Vec<KeyValue>,
    updated_by: String,
  ) -> Result<usize> {
    let _guard = self.write.lock().await;
    let mut table = self.read_table().await?;
    let now = record::now();
    for kv in &updates {
      table.upsert(&ConfigUpdate::new(&kv.key, &kv.value, &updated_by), now)?;
    }
    self.write_table(&table).await?;
    tracing::info!(count = updates.len(), %updated_by, "config batch applied");
    Ok(updates.len())
  }

  async fn delete(&self, key: &str) -> Result<ConfigRecord> {
    let _guard = self.write.lock().await;
    let mut table = self.read_table().await?;
    let removed = table.remove(key)?;
    self.write_table(&table).await?;
    tracing::info!(key, "config deleted");
    Ok(removed)
  }

  async fn history(&self, key: &str) -> Result<Option<ConfigHistory>> {
    let Some(current) = self.get(key).await? else {
      return Ok(None);
    };

    let history = match self.git_history(key).await {
      Ok(entries) => collapse_repeats(entries),
      Err(error) => {
        tracing::warn!(key, %error, "git history unavailable; returning current value only");
        Vec::new()
      }
    };

    Ok(Some(ConfigHistory {
      key: key.to_owned(),
      current,
      history,
    }))
  }

  async fn backup_history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
    let mut entries = Vec::new();
    for file in backups::list(&self.backups_dir()).await? {
      let table = match tokio::fs::read(&file).await {
        Ok(bytes) => match decode_table(&bytes) {
          Ok(table) => table,
          Err(error) => {
            tracing::warn!(?file, %error, "skipping unparsable backup");
            continue;
          }
        },
        Err(error) => {
          tracing::warn!(?file, %error, "skipping unreadable backup");
          continue;
        }
      };

      if let Some(r) = table.get(key) {
        let stamped = file
          .file_name()
          .and_then(|n| backups::parse_snapshot_time(&n.to_string_lossy()));
        entries.push(HistoryEntry {
          updated_at: stamped.unwrap_or(r.updated_at),
          ..HistoryEntry::from(r)
        });
      }
    }
    Ok(entries)
  }
}
