//! Dated snapshots under `<dir>/backups/config-YYYY-MM-DD-HHMMSS.csv`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::Result;

const PREFIX: &str = "config-";
const SUFFIX: &str = ".csv";
const STAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// File name for a snapshot taken at `at`.
pub fn snapshot_name(at: DateTime<Utc>) -> String {
  format!("{PREFIX}{}{SUFFIX}", at.format(STAMP_FORMAT))
}

/// Recover the snapshot time encoded in a file name, if it follows the
/// `config-YYYY-MM-DD-HHMMSS` pattern.
pub fn parse_snapshot_time(file_name: &str) -> Option<DateTime<Utc>> {
  let stamp = file_name.strip_prefix(PREFIX)?.get(..17)?;
  NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
    .ok()
    .map(|naive| naive.and_utc())
}

/// Snapshot files in `dir`, newest first. A missing directory is empty.
pub async fn list(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut entries = match tokio::fs::read_dir(dir).await {
    Ok(entries) => entries,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => return Err(e.into()),
  };

  let mut files = Vec::new();
  while let Some(entry) = entries.next_entry().await? {
    let name = entry.file_name();
    let name = name.to_string_lossy();
    if name.starts_with(PREFIX) && name.ends_with(SUFFIX) {
      files.push(entry.path());
    }
  }
  files.sort();
  files.reverse();
  Ok(files)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn name_and_time_agree() {
    let at = Utc.with_ymd_and_hms(2025, 10, 29, 15, 0, 0).unwrap();
    let name = snapshot_name(at);
    assert_eq!(name, "config-2025-10-29-150000.csv");
    assert_eq!(parse_snapshot_time(&name), Some(at));
  }

  #[test]
  fn unrelated_names_have_no_time() {
    assert_eq!(parse_snapshot_time("config-latest.csv"), None);
    assert_eq!(parse_snapshot_time("notes.csv"), None);
  }
}
