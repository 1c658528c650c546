//! Error type for `benchtop-store-csv`.

use benchtop_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] benchtop_core::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  /// A row parsed as CSV but one of its columns is malformed.
  #[error("parse error: {0}")]
  Parse(String),

  #[error("git error: {0}")]
  Git(String),
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
