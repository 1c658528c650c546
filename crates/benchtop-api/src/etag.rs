//! ETag computation for configuration records.
//!
//! A record's ETag is a SHA-256 over its key, version and `updated_at`. The
//! collection ETag hashes every record's triple, sorted by key, so storage
//! order does not matter.

use benchtop_core::record::ConfigRecord;
use sha2::{Digest, Sha256};

fn feed(hasher: &mut Sha256, r: &ConfigRecord) {
  hasher.update(r.key.as_bytes());
  hasher.update([0u8]);
  hasher.update(r.version.to_le_bytes());
  hasher.update(r.updated_at.timestamp_millis().to_le_bytes());
}

fn quoted(hasher: Sha256) -> String {
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Compute the ETag for a single record.
pub fn record_etag(record: &ConfigRecord) -> String {
  let mut hasher = Sha256::new();
  feed(&mut hasher, record);
  quoted(hasher)
}

/// Compute the ETag for a set of records, independent of their order.
pub fn table_etag(records: &[ConfigRecord]) -> String {
  let mut sorted: Vec<&ConfigRecord> = records.iter().collect();
  sorted.sort_by(|a, b| a.key.cmp(&b.key));

  let mut hasher = Sha256::new();
  for r in sorted {
    feed(&mut hasher, r);
  }
  quoted(hasher)
}

/// Whether an `If-Match` header value admits `etag`. Accepts `*` and
/// comma-separated lists; weak validators are compared by their opaque tag.
pub fn if_match_admits(header: &str, etag: &str) -> bool {
  header.split(',').map(str::trim).any(|candidate| {
    candidate == "*" || candidate.trim_start_matches("W/") == etag
  })
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn record(key: &str, version: u64, ms: i64) -> ConfigRecord {
    ConfigRecord {
      version,
      ..ConfigRecord::new(key, "v", "u", Utc.timestamp_millis_opt(ms).unwrap())
    }
  }

  #[test]
  fn order_does_not_matter() {
    let a = record("a", 1, 1_000);
    let b = record("b", 3, 2_000);
    assert_eq!(
      table_etag(&[a.clone(), b.clone()]),
      table_etag(&[b, a])
    );
  }

  #[test]
  fn version_bump_changes_etag() {
    let r1 = record("seo.title", 1, 1_000);
    let r2 = record("seo.title", 2, 1_000);
    assert_ne!(record_etag(&r1), record_etag(&r2));
  }

  #[test]
  fn if_match_forms() {
    let tag = record_etag(&record("k", 1, 0));
    assert!(if_match_admits(&tag, &tag));
    assert!(if_match_admits("*", &tag));
    assert!(if_match_admits(&format!("\"other\", W/{tag}"), &tag));
    assert!(!if_match_admits("\"other\"", &tag));
  }
}
