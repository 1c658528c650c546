use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("I/O error reading {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed test case file: {0}")]
  Csv(#[from] csv::Error),

  #[error("malformed product file: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
