//! Configuration records, one row per dot-namespaced key.

use chrono::{DateTime, SubsecRound as _, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// RFC 3339 UTC with millisecond precision, e.g. `2025-10-29T15:00:00.000Z`.
pub mod timestamp {
  use chrono::{DateTime, SecondsFormat, Utc};
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub fn encode(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
  }

  pub fn decode(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s.trim()).map(|dt| dt.with_timezone(&Utc))
  }

  pub fn serialize<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&encode(dt))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    decode(&raw).map_err(D::Error::custom)
  }
}

/// The current time truncated to the precision we persist.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(3) }

// ─── Record ──────────────────────────────────────────────────────────────────

/// A single configuration entry.
///
/// `version` starts at 1 and increases by exactly one on every successful
/// write to the same key. No two records in a table share a `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
  pub key:        String,
  pub value:      String,
  pub updated_by: String,
  #[serde(with = "timestamp")]
  pub updated_at: DateTime<Utc>,
  pub version:    u64,
}

impl ConfigRecord {
  /// A brand-new record at version 1.
  pub fn new(
    key: impl Into<String>,
    value: impl Into<String>,
    updated_by: impl Into<String>,
    at: DateTime<Utc>,
  ) -> Self {
    Self {
      key:        key.into(),
      value:      value.into(),
      updated_by: updated_by.into(),
      updated_at: at,
      version:    1,
    }
  }

  /// The next revision of this record.
  ///
  /// `updated_at` is forced strictly past the previous timestamp so that two
  /// writes inside the same millisecond still order correctly.
  pub fn revised(
    &self,
    value: impl Into<String>,
    updated_by: impl Into<String>,
    now: DateTime<Utc>,
  ) -> Self {
    let floor = self.updated_at + TimeDelta::milliseconds(1);
    Self {
      key:        self.key.clone(),
      value:      value.into(),
      updated_by: updated_by.into(),
      updated_at: now.max(floor),
      version:    self.version + 1,
    }
  }
}

// ─── Write inputs ────────────────────────────────────────────────────────────

/// A single upsert request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigUpdate {
  pub key:              String,
  pub value:            String,
  pub updated_by:       String,
  /// When set, the write only succeeds if the stored version matches.
  /// `Some(0)` asserts that the key does not exist yet.
  pub expected_version: Option<u64>,
}

impl ConfigUpdate {
  pub fn new(
    key: impl Into<String>,
    value: impl Into<String>,
    updated_by: impl Into<String>,
  ) -> Self {
    Self {
      key:              key.into(),
      value:            value.into(),
      updated_by:       updated_by.into(),
      expected_version: None,
    }
  }

  pub fn expecting(mut self, version: u64) -> Self {
    self.expected_version = Some(version);
    self
  }

  /// Fail with [`Error::Conflict`] if `current` does not match the expected
  /// version.
  pub fn check_version(&self, current: Option<u64>) -> Result<()> {
    match self.expected_version {
      Some(expected) if expected != current.unwrap_or(0) => {
        Err(Error::Conflict {
          key: self.key.clone(),
          expected,
          actual: current.unwrap_or(0),
        })
      }
      _ => Ok(()),
    }
  }
}

/// One entry of a batch update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
  pub key:   String,
  pub value: String,
}

impl KeyValue {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self { key: key.into(), value: value.into() }
  }
}

/// Keys must be non-empty and free of surrounding whitespace.
pub fn validate_key(key: &str) -> Result<()> {
  if key.is_empty() || key.trim() != key {
    return Err(Error::InvalidKey(key.to_owned()));
  }
  Ok(())
}
