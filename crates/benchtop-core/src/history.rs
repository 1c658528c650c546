//! Derived per-key history.
//!
//! History is never stored alongside the live table. Backends reconstruct it
//! from wherever past revisions happen to live (git commits, backup
//! snapshots, an append-only table) and hand back newest-first entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{ConfigRecord, timestamp};

/// One past value of a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub value:      String,
  pub updated_by: String,
  #[serde(with = "timestamp")]
  pub updated_at: DateTime<Utc>,
  pub version:    u64,
  /// Abbreviated commit hash, for git-derived entries.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub commit:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message:    Option<String>,
}

impl From<&ConfigRecord> for HistoryEntry {
  fn from(r: &ConfigRecord) -> Self {
    Self {
      value:      r.value.clone(),
      updated_by: r.updated_by.clone(),
      updated_at: r.updated_at,
      version:    r.version,
      commit:     None,
      message:    None,
    }
  }
}

/// The current record together with its reconstructed history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigHistory {
  pub key:     String,
  pub current: ConfigRecord,
  /// Newest first, consecutive duplicate values collapsed.
  pub history: Vec<HistoryEntry>,
}

/// Collapse runs of identical values, keeping the first entry of each run.
///
/// `A, A, B, B, A` becomes `A, B, A`.
pub fn collapse_repeats(mut entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
  entries.dedup_by(|later, kept| later.value == kept.value);
  entries
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn entry(value: &str, version: u64) -> HistoryEntry {
    HistoryEntry {
      value: value.into(),
      updated_by: "u".into(),
      updated_at: Utc.timestamp_opt(version as i64, 0).unwrap(),
      version,
      commit: None,
      message: None,
    }
  }

  #[test]
  fn alternating_values_collapse_to_three() {
    let entries = vec![
      entry("A", 5),
      entry("A", 4),
      entry("B", 3),
      entry("B", 2),
      entry("A", 1),
    ];
    let collapsed = collapse_repeats(entries);
    let values: Vec<_> = collapsed.iter().map(|e| e.value.as_str()).collect();
    assert_eq!(values, ["A", "B", "A"]);
    // The first entry of each run survives.
    let versions: Vec<_> = collapsed.iter().map(|e| e.version).collect();
    assert_eq!(versions, [5, 3, 1]);
  }

  #[test]
  fn empty_history_stays_empty() {
    assert!(collapse_repeats(Vec::new()).is_empty());
  }

  #[test]
  fn git_fields_are_omitted_when_absent() {
    let json = serde_json::to_value(entry("A", 1)).unwrap();
    assert!(json.get("commit").is_none());
    assert!(json.get("message").is_none());
  }
}
