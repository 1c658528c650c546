//! Encoding and decoding between [`ConfigTable`] and CSV bytes.
//!
//! Header row: `key,value,updated_by,updated_at,version`. Columns are matched
//! by header name, so reordered or extra columns are tolerated. Timestamps
//! are RFC 3339 UTC with millisecond precision.

use benchtop_core::{
  record::{ConfigRecord, timestamp},
  table::ConfigTable,
};
use serde::Deserialize;

use crate::{Error, Result};

pub const HEADER: [&str; 5] =
  ["key", "value", "updated_by", "updated_at", "version"];

/// A row exactly as it appears in the file.
#[derive(Debug, Deserialize)]
struct RawRecord {
  key:        String,
  value:      String,
  updated_by: String,
  updated_at: String,
  version:    String,
}

impl TryFrom<RawRecord> for ConfigRecord {
  type Error = Error;

  fn try_from(raw: RawRecord) -> Result<Self> {
    let version = raw.version.trim().parse::<u64>().map_err(|_| {
      Error::Parse(format!("bad version {:?} for key {:?}", raw.version, raw.key))
    })?;
    let updated_at = timestamp::decode(&raw.updated_at).map_err(|e| {
      Error::Parse(format!(
        "bad updated_at {:?} for key {:?}: {e}",
        raw.updated_at, raw.key
      ))
    })?;
    Ok(ConfigRecord {
      key: raw.key,
      value: raw.value,
      updated_by: raw.updated_by,
      updated_at,
      version,
    })
  }
}

/// Parse a whole file. Empty input is an empty table.
pub fn decode_table(bytes: &[u8]) -> Result<ConfigTable> {
  let mut rdr = csv::ReaderBuilder::new()
    .has_headers(true)
    .from_reader(bytes);
  rdr
    .deserialize::<RawRecord>()
    .map(|row| ConfigRecord::try_from(row?))
    .collect()
}

/// Serialise a whole table, header row first.
pub fn encode_table(table: &ConfigTable) -> Result<Vec<u8>> {
  let mut wtr = csv::WriterBuilder::new()
    .has_headers(false)
    .from_writer(Vec::new());
  wtr.write_record(HEADER)?;
  for r in table.iter() {
    let updated_at = timestamp::encode(&r.updated_at);
    let version = r.version.to_string();
    wtr.write_record([
      r.key.as_str(),
      r.value.as_str(),
      r.updated_by.as_str(),
      updated_at.as_str(),
      version.as_str(),
    ])?;
  }
  wtr.into_inner().map_err(|e| Error::Io(e.into_error()))
}
