//! Thin wrappers over the `git` executable.
//!
//! Every call runs with the CSV file's directory as the working directory, so
//! paths are given relative to it (`<rev>:./<file>`).

use std::path::Path;

use tokio::process::Command;

use crate::{Error, Result};

/// One commit that touched the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
  pub hash:    String,
  pub author:  String,
  /// Seconds since the epoch.
  pub time:    i64,
  pub subject: String,
}

impl Commit {
  pub fn short_hash(&self) -> &str {
    self.hash.get(..7).unwrap_or(&self.hash)
  }
}

async fn run(dir: &Path, args: &[&str]) -> Result<Vec<u8>> {
  tracing::debug!(?dir, ?args, "running git");
  let output = Command::new("git")
    .args(args)
    .current_dir(dir)
    .output()
    .await
    .map_err(|e| Error::Git(format!("failed to spawn git: {e}")))?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(Error::Git(format!(
      "git {} exited with {}: {}",
      args.first().unwrap_or(&""),
      output.status,
      stderr.trim()
    )));
  }
  Ok(output.stdout)
}

/// Commits touching `file` across all refs, newest first.
pub async fn log(dir: &Path, file: &str) -> Result<Vec<Commit>> {
  let stdout = run(
    dir,
    &["log", "--all", "--pretty=format:%H|%an|%at|%s", "--", file],
  )
  .await?;
  Ok(
    String::from_utf8_lossy(&stdout)
      .lines()
      .filter_map(parse_log_line)
      .collect(),
  )
}

/// The contents of `file` as of `hash`.
pub async fn show(dir: &Path, hash: &str, file: &str) -> Result<Vec<u8>> {
  run(dir, &["show", &format!("{hash}:./{file}")]).await
}

/// Parse one `%H|%an|%at|%s` line. The subject may itself contain `|`.
fn parse_log_line(line: &str) -> Option<Commit> {
  let mut parts = line.splitn(4, '|');
  let hash = parts.next()?.trim();
  if hash.is_empty() {
    return None;
  }
  let author = parts.next().unwrap_or_default();
  let time = parts.next().and_then(|t| t.parse().ok()).unwrap_or_default();
  let subject = parts.next().unwrap_or_default();
  Some(Commit {
    hash:    hash.to_owned(),
    author:  author.to_owned(),
    time,
    subject: subject.to_owned(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_log_line_with_pipe_in_subject() {
    let c = parse_log_line(
      "0123456789abcdef0123456789abcdef01234567|Alice|1730214000|seo: a|b",
    )
    .unwrap();
    assert_eq!(c.short_hash(), "0123456");
    assert_eq!(c.author, "Alice");
    assert_eq!(c.time, 1_730_214_000);
    assert_eq!(c.subject, "seo: a|b");
  }

  #[test]
  fn blank_lines_are_skipped() {
    assert!(parse_log_line("").is_none());
  }

  #[test]
  fn short_hash_tolerates_short_input() {
    let c = parse_log_line("abc|a|1|s").unwrap();
    assert_eq!(c.short_hash(), "abc");
  }
}
