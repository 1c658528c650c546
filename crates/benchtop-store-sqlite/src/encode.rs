//! Conversions between domain records and SQLite column values.

use benchtop_core::{
  history::HistoryEntry,
  record::{ConfigRecord, timestamp},
};
use chrono::{DateTime, Utc};

use crate::{Error, Result};

pub const COLUMNS: &str = "key, value, updated_by, updated_at, version";

pub fn encode_dt(dt: &DateTime<Utc>) -> String { timestamp::encode(dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  timestamp::decode(s).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_version(v: u64) -> i64 { i64::try_from(v).unwrap_or(i64::MAX) }

pub fn decode_version(v: i64) -> Result<u64> {
  u64::try_from(v)
    .ok()
    .filter(|v| *v >= 1)
    .ok_or(Error::Version(v))
}

/// A row as read from `config` or `config_history`, before decoding.
#[derive(Debug)]
pub struct RawRecord {
  pub key:        String,
  pub value:      String,
  pub updated_by: String,
  pub updated_at: String,
  pub version:    i64,
}

impl RawRecord {
  /// Read the five [`COLUMNS`] in order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      key:        row.get(0)?,
      value:      row.get(1)?,
      updated_by: row.get(2)?,
      updated_at: row.get(3)?,
      version:    row.get(4)?,
    })
  }

  pub fn from_record(r: &ConfigRecord) -> Self {
    Self {
      key:        r.key.clone(),
      value:      r.value.clone(),
      updated_by: r.updated_by.clone(),
      updated_at: encode_dt(&r.updated_at),
      version:    encode_version(r.version),
    }
  }

  pub fn into_record(self) -> Result<ConfigRecord> {
    Ok(ConfigRecord {
      updated_at: decode_dt(&self.updated_at)?,
      version:    decode_version(self.version)?,
      key:        self.key,
      value:      self.value,
      updated_by: self.updated_by,
    })
  }

  pub fn into_history_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry::from(&self.into_record()?))
  }
}
