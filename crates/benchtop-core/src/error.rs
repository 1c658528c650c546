//! Error types for `benchtop-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("key not found: {0}")]
  NotFound(String),

  /// An optimistic write named a version that is no longer current.
  /// `actual` is `0` when the key does not exist.
  #[error("version conflict on {key}: expected {expected}, found {actual}")]
  Conflict {
    key:      String,
    expected: u64,
    actual:   u64,
  },

  #[error("invalid key: {0:?}")]
  InvalidKey(String),

  #[error("invalid search pattern: {0}")]
  InvalidPattern(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
