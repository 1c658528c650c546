//! Batch validation of the engine against scripted test cases, and the
//! exhaustive weight search built on top of it.

use std::path::Path;

use crate::{
  cases::{TestCase, load_cases},
  catalog::{Product, load_products},
  engine::{QuizEngine, Weights, categorize, product_type},
  error::Result,
};

/// Grid searched by [`QuizValidator::optimize_weights`].
const APPLICATION_GRID: [f64; 5] = [0.3, 0.35, 0.4, 0.45, 0.5];
const MAGNIFICATION_GRID: [f64; 3] = [0.15, 0.2, 0.25];
const CAMERA_GRID: [f64; 3] = [0.1, 0.15, 0.2];
const PERSONA_GRID: [f64; 3] = [0.1, 0.15, 0.2];
const BUDGET_GRID: [f64; 3] = [0.05, 0.1, 0.15];

/// Weight sets summing outside this band are not tried.
const WEIGHT_SUM_RANGE: std::ops::RangeInclusive<f64> = 0.95..=1.05;

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

// ─── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
  pub test_id:            String,
  pub sample:             String,
  pub expected_type:      String,
  pub predicted_type:     String,
  pub expected_category:  String,
  pub predicted_category: String,
  pub product:            String,
  pub score:              f64,
}

/// Expected type → predicted type → count, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
  rows: Vec<(String, Vec<(String, usize)>)>,
}

impl ConfusionMatrix {
  pub fn record(&mut self, expected: &str, predicted: &str) {
    let row = match self.rows.iter().position(|(e, _)| e == expected) {
      Some(i) => &mut self.rows[i].1,
      None => {
        self.rows.push((expected.to_owned(), Vec::new()));
        let last = self.rows.len() - 1;
        &mut self.rows[last].1
      }
    };
    match row.iter_mut().find(|(p, _)| p == predicted) {
      Some((_, count)) => *count += 1,
      None => row.push((predicted.to_owned(), 1)),
    }
  }

  pub fn count(&self, expected: &str, predicted: &str) -> usize {
    self
      .cells()
      .find(|(e, p, _)| *e == expected && *p == predicted)
      .map_or(0, |(_, _, n)| n)
  }

  /// `(expected, predicted, count)` triples in first-seen order.
  pub fn cells(&self) -> impl Iterator<Item = (&str, &str, usize)> {
    self.rows.iter().flat_map(|(expected, row)| {
      row
        .iter()
        .map(move |(predicted, n)| (expected.as_str(), predicted.as_str(), *n))
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResults {
  pub total:             usize,
  pub correct_type:      usize,
  pub correct_category:  usize,
  /// Percentages; 0 when there are no cases.
  pub type_accuracy:     f64,
  pub category_accuracy: f64,
  pub mismatches:        Vec<Mismatch>,
  pub confusion:         ConfusionMatrix,
}

fn percent(part: usize, total: usize) -> f64 {
  if total == 0 {
    0.0
  } else {
    part as f64 / total as f64 * 100.0
  }
}

/// Outcome of a weight search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Optimization {
  pub accuracy: f64,
  pub weights:  Weights,
  /// How many in-band weight sets were evaluated.
  pub tested:   usize,
}

// ─── Validator ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct QuizValidator {
  pub cases:    Vec<TestCase>,
  pub products: Vec<Product>,
  pub engine:   QuizEngine,
}

impl QuizValidator {
  pub fn new(cases: Vec<TestCase>, products: Vec<Product>) -> Self {
    Self {
      cases,
      products,
      engine: QuizEngine::default(),
    }
  }

  pub fn from_files(cases: &Path, products: &Path) -> Result<Self> {
    Ok(Self::new(load_cases(cases)?, load_products(products)?))
  }

  /// Predict every case with the current weights and tally the outcome.
  pub fn run_validation(&self) -> ValidationResults {
    let mut results = ValidationResults {
      total: self.cases.len(),
      ..ValidationResults::default()
    };

    for case in &self.cases {
      let Some(best) = self.engine.predict(case, &self.products) else {
        continue;
      };
      let predicted_type = product_type(best.product).to_string();
      let predicted_category = categorize(best.product).to_string();

      if case.expected_type == predicted_type {
        results.correct_type += 1;
      } else {
        results.mismatches.push(Mismatch {
          test_id:            case.test_id.clone(),
          sample:             case.sample_type.clone(),
          expected_type:      case.expected_type.clone(),
          predicted_type:     predicted_type.clone(),
          expected_category:  case.expected_product_category.clone(),
          predicted_category: predicted_category.clone(),
          product:            best.product.title.clone(),
          score:              best.score,
        });
      }

      if case.expected_product_category == predicted_category {
        results.correct_category += 1;
      }

      results.confusion.record(&case.expected_type, &predicted_type);
    }

    results.type_accuracy = percent(results.correct_type, results.total);
    results.category_accuracy = percent(results.correct_category, results.total);
    results
  }

  /// Exhaustively try in-band weight sets, stopping after `max_iterations`
  /// evaluations, and install the best one found. A later set only replaces
  /// the best if its type accuracy is strictly higher.
  pub fn optimize_weights(&mut self, max_iterations: usize) -> Optimization {
    let mut best = Optimization {
      accuracy: 0.0,
      weights:  self.engine.weights,
      tested:   0,
    };

    'search: for application in APPLICATION_GRID {
      for magnification in MAGNIFICATION_GRID {
        for camera in CAMERA_GRID {
          for persona in PERSONA_GRID {
            for budget in BUDGET_GRID {
              let total = application + magnification + camera + persona + budget;
              if !WEIGHT_SUM_RANGE.contains(&total) {
                continue;
              }

              let weights = Weights {
                application,
                magnification,
                camera,
                persona,
                budget,
              };
              self.engine.weights = weights;
              let accuracy = self.run_validation().type_accuracy;

              if accuracy > best.accuracy {
                best.accuracy = accuracy;
                best.weights = weights;
                tracing::info!(accuracy, ?weights, "new best weights");
              }

              best.tested += 1;
              if best.tested >= max_iterations {
                break 'search;
              }
            }
          }
        }
      }
    }

    tracing::info!(tested = best.tested, "weight search finished");
    self.engine.weights = best.weights;
    best
  }
}
