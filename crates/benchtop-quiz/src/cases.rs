//! Quiz test cases, read from a CSV file with a header row.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One scripted quiz answer set plus the outcome it should produce.
///
/// Missing cells read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestCase {
  pub test_id:                   String,
  pub sample_type:               String,
  pub sample_opacity:            String,
  pub persona:                   String,
  pub camera_need:               String,
  pub magnification:             String,
  pub budget:                    String,
  pub special_features:          String,
  pub expected_type:             String,
  pub expected_product_category: String,
  pub notes:                     String,
}

/// Parse test cases from CSV text. Cells are trimmed and short rows are
/// padded with empty cells.
pub fn parse_cases(csv_text: &str) -> Result<Vec<TestCase>> {
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .flexible(true)
    .from_reader(csv_text.as_bytes());

  reader
    .deserialize()
    .collect::<Result<Vec<TestCase>, csv::Error>>()
    .map_err(Error::from)
}

pub fn load_cases(path: &Path) -> Result<Vec<TestCase>> {
  let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.display().to_string(),
    source,
  })?;
  let cases = parse_cases(&text)?;
  tracing::info!(count = cases.len(), ?path, "loaded test cases");
  Ok(cases)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_trimmed_cells_and_pads_short_rows() {
    let text = "test_id, sample_type ,sample_opacity,persona,camera_need,magnification,budget,special_features,expected_type,expected_product_category,notes\n\
                1, insect wing ,opaque,education,no,40,500,LED,stereo,education,\n\
                \n\
                2,cheek cells,transparent,clinical\n";
    let cases = parse_cases(text).unwrap();
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].sample_type, "insect wing");
    assert_eq!(cases[0].special_features, "LED");
    assert_eq!(cases[1].persona, "clinical");
    assert_eq!(cases[1].budget, "");
  }

  #[test]
  fn quoted_cells_may_contain_commas() {
    let text = "test_id,sample_type,notes\n3,\"rocks, minerals\",\"a, b\"\n";
    let cases = parse_cases(text).unwrap();
    assert_eq!(cases[0].sample_type, "rocks, minerals");
    assert_eq!(cases[0].notes, "a, b");
  }
}
