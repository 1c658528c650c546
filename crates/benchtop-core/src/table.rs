//! [`ConfigTable`]: an ordered, in-memory view of every record.
//!
//! File-backed stores parse the whole table, mutate it here, and write it
//! back. Lookups are linear scans; tables are expected to hold at most a few
//! hundred rows.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  record::{ConfigRecord, ConfigUpdate, validate_key},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigTable {
  records: Vec<ConfigRecord>,
}

impl ConfigTable {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = &ConfigRecord> {
    self.records.iter()
  }

  pub fn get(&self, key: &str) -> Option<&ConfigRecord> {
    self.records.iter().find(|r| r.key == key)
  }

  /// Insert or revise a record, returning the written row.
  ///
  /// New keys are appended at version 1; existing keys are replaced in
  /// place so file order is preserved.
  pub fn upsert(
    &mut self,
    update: &ConfigUpdate,
    now: DateTime<Utc>,
  ) -> Result<ConfigRecord> {
    validate_key(&update.key)?;
    let idx = self.records.iter().position(|r| r.key == update.key);
    update.check_version(idx.map(|i| self.records[i].version))?;

    let written = match idx {
      Some(i) => {
        let next =
          self.records[i].revised(&update.value, &update.updated_by, now);
        self.records[i] = next.clone();
        next
      }
      None => {
        let fresh = ConfigRecord::new(
          &update.key,
          &update.value,
          &update.updated_by,
          now,
        );
        self.records.push(fresh.clone());
        fresh
      }
    };
    Ok(written)
  }

  /// Remove every row for `key`, returning the first. Fails with
  /// [`Error::NotFound`] if the key is absent.
  pub fn remove(&mut self, key: &str) -> Result<ConfigRecord> {
    let idx = self
      .records
      .iter()
      .position(|r| r.key == key)
      .ok_or_else(|| Error::NotFound(key.to_owned()))?;
    let removed = self.records.remove(idx);
    self.records.retain(|r| r.key != key);
    Ok(removed)
  }

  pub fn into_records(self) -> Vec<ConfigRecord> { self.records }
}

impl FromIterator<ConfigRecord> for ConfigTable {
  fn from_iter<I: IntoIterator<Item = ConfigRecord>>(iter: I) -> Self {
    Self { records: iter.into_iter().collect() }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn upsert_appends_then_revises_in_place() {
    let mut t = ConfigTable::new();
    t.upsert(&ConfigUpdate::new("a", "1", "u"), at(1)).unwrap();
    t.upsert(&ConfigUpdate::new("b", "2", "u"), at(1)).unwrap();
    let r = t.upsert(&ConfigUpdate::new("a", "3", "v"), at(2)).unwrap();

    assert_eq!(r.version, 2);
    let keys: Vec<_> = t.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["a", "b"]);
    assert_eq!(t.get("a").unwrap().value, "3");
  }

  #[test]
  fn upsert_rejects_stale_version_without_mutating() {
    let mut t = ConfigTable::new();
    t.upsert(&ConfigUpdate::new("a", "1", "u"), at(1)).unwrap();
    let before = t.clone();
    let err = t
      .upsert(&ConfigUpdate::new("a", "2", "u").expecting(7), at(2))
      .unwrap_err();
    assert!(matches!(err, Error::Conflict { actual: 1, .. }));
    assert_eq!(t, before);
  }

  #[test]
  fn remove_missing_key_is_not_found() {
    let mut t = ConfigTable::new();
    assert!(matches!(t.remove("nope"), Err(Error::NotFound(k)) if k == "nope"));
  }

  #[test]
  fn remove_drops_duplicate_rows() {
    let mut t: ConfigTable = [
      ConfigRecord::new("a", "A", "u", at(1)),
      ConfigRecord::new("b", "x", "u", at(1)),
      ConfigRecord::new("a", "B", "u", at(2)),
    ]
    .into_iter()
    .collect();

    assert_eq!(t.remove("a").unwrap().value, "A");
    assert!(t.get("a").is_none());
    assert_eq!(t.len(), 1);
  }

  #[test]
  fn empty_key_is_rejected() {
    let mut t = ConfigTable::new();
    assert!(matches!(
      t.upsert(&ConfigUpdate::new("", "v", "u"), at(1)),
      Err(Error::InvalidKey(_))
    ));
  }
}
