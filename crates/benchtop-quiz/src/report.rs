//! Plain-text validation report.

use std::fmt::Write as _;

use crate::{engine::Weights, validator::ValidationResults};

const WIDTH: usize = 80;
const MISMATCH_LIMIT: usize = 20;

pub fn render(results: &ValidationResults, weights: &Weights) -> String {
  let heavy = "=".repeat(WIDTH);
  let light = "-".repeat(WIDTH);
  let mut out = String::new();

  // `write!` into a `String` cannot fail.
  let _ = writeln!(out, "{heavy}\nMICROSCOPE QUIZ VALIDATION REPORT\n{heavy}\n");

  let _ = writeln!(out, "OVERALL ACCURACY\n{light}");
  let _ = writeln!(out, "Total test cases: {}", results.total);
  let _ = writeln!(
    out,
    "Type accuracy: {:.1}% ({}/{})",
    results.type_accuracy, results.correct_type, results.total
  );
  let _ = writeln!(
    out,
    "Category accuracy: {:.1}% ({}/{})\n",
    results.category_accuracy, results.correct_category, results.total
  );

  let _ = writeln!(out, "CURRENT WEIGHTS\n{light}");
  for (name, value) in weights.entries() {
    let _ = writeln!(out, "{name:<15}: {value:.2}");
  }
  out.push('\n');

  let _ = writeln!(out, "TYPE CONFUSION MATRIX\n{light}");
  let _ = writeln!(out, "{:<15} {:<15} {:<10}\n{light}", "Expected", "Predicted", "Count");
  for (expected, predicted, count) in results.confusion.cells() {
    let marker = if expected == predicted { '✓' } else { '✗' };
    let _ = writeln!(out, "{expected:<15} {predicted:<15} {count:<10} {marker}");
  }
  out.push('\n');

  let _ = writeln!(out, "MISMATCHES (First {MISMATCH_LIMIT})\n{light}");
  for m in results.mismatches.iter().take(MISMATCH_LIMIT) {
    let _ = writeln!(out, "Test #{}: {}", m.test_id, m.sample);
    let _ = writeln!(out, "  Expected: {} ({})", m.expected_type, m.expected_category);
    let _ = writeln!(out, "  Predicted: {} ({})", m.predicted_type, m.predicted_category);
    let _ = writeln!(out, "  Product: {}", m.product);
    let _ = writeln!(out, "  Score: {:.3}\n", m.score);
  }

  out.push_str(&heavy);
  out.push('\n');
  out
}
