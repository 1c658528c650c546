//! [`SqliteStore`]: the SQLite implementation of [`ConfigStore`].

use std::path::Path;

use benchtop_core::{
  history::{ConfigHistory, collapse_repeats},
  record::{self, ConfigRecord, ConfigUpdate, KeyValue},
  store::ConfigStore,
  table::ConfigTable,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{COLUMNS, RawRecord},
  schema::SCHEMA,
};

/// How many times an unconditional write is retried after losing a race.
const MAX_WRITE_ATTEMPTS: usize = 8;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A configuration store backed by a single SQLite file.
///
/// Writes are optimistic: each row update carries
/// `WHERE key = ? AND version = ?`, so a concurrent writer can never be
/// silently overwritten. Callers that pass an expected version get a
/// [`benchtop_core::Error::Conflict`]; the rest are retried on fresh data.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn read_table(&self) -> Result<ConfigTable> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {COLUMNS} FROM config ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawRecord::into_record).collect()
  }

  /// Persist a sequence of revisions in one transaction.
  ///
  /// Each record is either a fresh insert (version 1) or an update guarded on
  /// its predecessor's version. Every write is mirrored into
  /// `config_history`. Returns `false`, with nothing committed, if any guard
  /// fails.
  async fn apply(&self, writes: Vec<ConfigRecord>) -> Result<bool> {
    let raws: Vec<RawRecord> = writes.iter().map(RawRecord::from_record).collect();

    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for raw in &raws {
          let changed = if raw.version == 1 {
            tx.execute(
              &format!("INSERT OR IGNORE INTO config ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
              rusqlite::params![raw.key, raw.value, raw.updated_by, raw.updated_at, raw.version],
            )?
          } else {
            tx.execute(
              "UPDATE config
                 SET value = ?2, updated_by = ?3, updated_at = ?4, version = ?5
               WHERE key = ?1 AND version = ?6",
              rusqlite::params![
                raw.key,
                raw.value,
                raw.updated_by,
                raw.updated_at,
                raw.version,
                raw.version - 1,
              ],
            )?
          };
          if changed == 0 {
            // Dropping `tx` rolls back.
            return Ok(false);
          }
          tx.execute(
            &format!("INSERT INTO config_history ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            rusqlite::params![raw.key, raw.value, raw.updated_by, raw.updated_at, raw.version],
          )?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;
    Ok(applied)
  }
}

// ─── ConfigStore impl ────────────────────────────────────────────────────────

impl ConfigStore for SqliteStore {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<ConfigRecord>> {
    let key = key.to_owned();
    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COLUMNS} FROM config WHERE key = ?1"),
              rusqlite::params![key],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawRecord::into_record).transpose()
  }

  async fn list(&self) -> Result<Vec<ConfigRecord>> {
    Ok(self.read_table().await?.into_records())
  }

  async fn set(&self, update: ConfigUpdate) -> Result<ConfigRecord> {
    for _ in 0..MAX_WRITE_ATTEMPTS {
      let current = self.get(&update.key).await?;
      let mut table: ConfigTable = current.into_iter().collect();
      let written = table.upsert(&update, record::now())?;

      if self.apply(vec![written.clone()]).await? {
        tracing::info!(
          key = %written.key,
          version = written.version,
          updated_by = %written.updated_by,
          "config updated"
        );
        return Ok(written);
      }
      // Lost a race. With an expected version the re-check on the next pass
      // reports the conflict; otherwise we simply retry on fresh data.
      tracing::debug!(key = %update.key, "write guard failed; retrying");
    }
    Err(Error::Contention(update.key))
  }

  async fn set_batch(
    &self,
    updates: Vec<KeyValue>,
    updated_by: String,
  ) -> Result<usize> {
    for _ in 0..MAX_WRITE_ATTEMPTS {
      let mut table = self.read_table().await?;
      let now = record::now();
      let mut writes = Vec::with_capacity(updates.len());
      for kv in &updates {
        writes.push(
          table.upsert(&ConfigUpdate::new(&kv.key, &kv.value, &updated_by), now)?,
        );
      }

      if self.apply(writes).await? {
        tracing::info!(count = updates.len(), %updated_by, "config batch applied");
        return Ok(updates.len());
      }
      tracing::debug!("batch write guard failed; retrying");
    }
    Err(Error::Contention(format!("batch of {}", updates.len())))
  }

  async fn delete(&self, key: &str) -> Result<ConfigRecord> {
    let owned = key.to_owned();
    let removed: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(
            &format!("SELECT {COLUMNS} FROM config WHERE key = ?1"),
            rusqlite::params![owned],
            RawRecord::from_row,
          )
          .optional()?;
        if raw.is_some() {
          tx.execute("DELETE FROM config WHERE key = ?1", rusqlite::params![owned])?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    let removed = removed
      .ok_or_else(|| benchtop_core::Error::NotFound(key.to_owned()))?
      .into_record()?;
    tracing::info!(key, "config deleted");
    Ok(removed)
  }

  async fn history(&self, key: &str) -> Result<Option<ConfigHistory>> {
    let Some(current) = self.get(key).await? else {
      return Ok(None);
    };

    let owned = key.to_owned();
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COLUMNS} FROM config_history WHERE key = ?1 ORDER BY history_id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owned], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let entries = raws
      .into_iter()
      .map(RawRecord::into_history_entry)
      .collect::<Result<Vec<_>>>()?;

    Ok(Some(ConfigHistory {
      key: key.to_owned(),
      current,
      history: collapse_repeats(entries),
    }))
  }
}
