//! Error type for `benchtop-store-sqlite`.

use benchtop_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] benchtop_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("invalid version {0} in database")]
  Version(i64),

  /// Optimistic writes kept losing to concurrent writers.
  #[error("gave up on {0:?} after repeated write conflicts")]
  Contention(String),
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&benchtop_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
