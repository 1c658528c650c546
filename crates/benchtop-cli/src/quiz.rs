//! `benchtop quiz validate`: score the quiz against scripted cases, and
//! search for better weights when accuracy is too low.

use std::path::Path;

use anyhow::{Context, Result};
use benchtop_quiz::{QuizValidator, report};

use crate::QuizAction;

fn write_report(validator: &QuizValidator, path: &Path) -> Result<f64> {
  let results = validator.run_validation();
  let text = report::render(&results, &validator.engine.weights);
  std::fs::write(path, text).with_context(|| format!("writing report {}", path.display()))?;
  println!("Report saved to: {}", path.display());
  println!(
    "Type accuracy: {:.1}%  Category accuracy: {:.1}%",
    results.type_accuracy, results.category_accuracy
  );
  Ok(results.type_accuracy)
}

pub fn run(action: QuizAction) -> Result<()> {
  let QuizAction::Validate {
    cases,
    products,
    report,
    optimized_report,
    optimize_below,
    weights_out,
    max_iterations,
  } = action;

  let mut validator = QuizValidator::from_files(&cases, &products)
    .context("loading quiz inputs")?;

  let initial = write_report(&validator, &report)?;
  if initial >= optimize_below {
    println!("Accuracy already at or above {optimize_below:.0}%; no optimization needed.");
    return Ok(());
  }

  println!("Accuracy below {optimize_below:.0}%, running optimization...");
  let best = validator.optimize_weights(max_iterations);
  println!("Tested {} weight combinations", best.tested);

  let after = write_report(&validator, &optimized_report)?;
  println!("Improvement: {:+.1}%", after - initial);

  let json = serde_json::to_string_pretty(&best.weights).context("encoding weights")?;
  std::fs::write(&weights_out, json)
    .with_context(|| format!("writing weights {}", weights_out.display()))?;
  println!("Optimized weights saved to: {}", weights_out.display());
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn low_accuracy_writes_optimized_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = |name: &str| dir.path().join(name);
    std::fs::write(
      path("cases.csv"),
      "test_id,sample_type,sample_opacity,expected_type\n1,insect,opaque,compound\n",
    )
    .unwrap();
    std::fs::write(path("products.json"), r#"[{"title":"Stereo 20x","price":100}]"#).unwrap();

    run(QuizAction::Validate {
      cases:            path("cases.csv"),
      products:         path("products.json"),
      report:           path("initial.txt"),
      optimized_report: path("optimized.txt"),
      optimize_below:   90.0,
      weights_out:      path("weights.json"),
      max_iterations:   3,
    })
    .unwrap();

    assert!(path("initial.txt").exists());
    assert!(path("optimized.txt").exists());
    let weights: benchtop_quiz::Weights =
      serde_json::from_str(&std::fs::read_to_string(path("weights.json")).unwrap()).unwrap();
    assert!(weights.application > 0.0);
  }
}
