//! The weighted scoring engine behind the microscope recommendation quiz.
//!
//! Every product gets a score against a test case; the highest score wins.
//! Scores are sums of independent heuristic terms, each scaled by one of the
//! [`Weights`].

use std::sync::LazyLock;

use benchtop_core::typed::parse_leading_int;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  cases::TestCase,
  catalog::{Metafields, Product},
};

const OPACITY_BONUS: f64 = 0.05;
const FEATURE_BONUS: f64 = 0.1;
const MAX_MAGNIFICATION_GAP: f64 = 2000.0;

const INVERTED_TERMS: &[&str] = &[
  "cell culture",
  "cells",
  "tissue culture",
  "embryo",
  "oocyte",
  "stem cell",
  "neuron",
  "culture",
  "adherent",
  "monolayer",
];

const STEREO_TERMS: &[&str] = &[
  "insect",
  "rock",
  "mineral",
  "circuit",
  "fiber",
  "metal",
  "pollen",
  "gemstone",
  "solder",
  "lichen",
  "moss",
  "fossil",
  "textile",
  "3d",
  "coin",
  "arthropod",
  "wood",
  "welding",
  "jewelry",
  "seed",
  "tree ring",
  "coral",
  "stamp",
  "flower",
  "beetle",
  "butterfly",
  "wire",
  "component",
  "surface mount",
];

const CAMERA_TERMS: &[&str] = &["camera", "trinocular", "digital", "usb", "imaging"];

static MAGNIFICATION: LazyLock<Option<Regex>> =
  LazyLock::new(|| Regex::new(r"(?i)(\d+)[-–]?(\d+)?x").ok());

// ─── Classification ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MicroscopeType {
  Compound,
  Inverted,
  Stereo,
  Digital,
}

impl MicroscopeType {
  /// Compound and inverted scopes both image transmitted light, so a miss
  /// between them earns partial credit.
  fn is_transmitted(self) -> bool {
    matches!(self, MicroscopeType::Compound | MicroscopeType::Inverted)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
  Education,
  Clinical,
  Research,
}

/// The microscope type a sample description calls for.
pub fn sample_type(sample: &str, opacity: &str) -> MicroscopeType {
  let sample = sample.to_lowercase();
  if INVERTED_TERMS.iter().any(|t| sample.contains(t)) {
    MicroscopeType::Inverted
  } else if opacity == "opaque" || STEREO_TERMS.iter().any(|t| sample.contains(t)) {
    MicroscopeType::Stereo
  } else {
    MicroscopeType::Compound
  }
}

/// The microscope type a product is, judged from its title and
/// applications.
pub fn product_type(product: &Product) -> MicroscopeType {
  let title = product.title_lower();
  let applications = Product::field_lower(&product.metafields.applications);
  let either = |term: &str| title.contains(term) || applications.contains(term);

  if either("inverted") {
    MicroscopeType::Inverted
  } else if either("stereo") {
    MicroscopeType::Stereo
  } else if title.contains("digital") || title.contains("camera") {
    MicroscopeType::Digital
  } else {
    MicroscopeType::Compound
  }
}

pub fn has_camera(product: &Product) -> bool {
  let title = product.title_lower();
  let features = Product::field_lower(&product.metafields.features);
  CAMERA_TERMS
    .iter()
    .any(|t| features.contains(t) || title.contains(t))
}

/// The highest magnification quoted in the product's specs or title, or 0.
///
/// A range such as `10-40x` counts as its upper bound.
pub fn magnification(product: &Product) -> u64 {
  let Some(re) = MAGNIFICATION.as_ref() else {
    return 0;
  };
  let Metafields { specs, .. } = &product.metafields;
  let text = format!("{} {}", specs.as_deref().unwrap_or_default(), product.title);
  re.captures_iter(&text)
    .filter_map(|caps| caps.get(2).or_else(|| caps.get(1)))
    .filter_map(|m| m.as_str().parse::<u64>().ok())
    .max()
    .unwrap_or(0)
}

/// Whether the product's category or title markets it to `persona`.
fn markets_to(product: &Product, persona: Category) -> bool {
  let category = Product::field_lower(&product.metafields.equipment_category);
  let title = product.title_lower();
  match persona {
    Category::Education => category.contains("education") || title.contains("student"),
    Category::Clinical => category.contains("clinical") || title.contains("clinical"),
    Category::Research => category.contains("research") || title.contains("professional"),
  }
}

fn price_bucket(price: f64) -> Category {
  if price < 600.0 {
    Category::Education
  } else if price < 1400.0 {
    Category::Clinical
  } else {
    Category::Research
  }
}

/// Keyword category first, then price bucket.
pub fn categorize(product: &Product) -> Category {
  [Category::Education, Category::Clinical, Category::Research]
    .into_iter()
    .find(|c| markets_to(product, *c))
    .unwrap_or_else(|| price_bucket(product.price))
}

// ─── Weights ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
  pub application:   f64,
  pub magnification: f64,
  pub camera:        f64,
  pub persona:       f64,
  pub budget:        f64,
}

impl Default for Weights {
  fn default() -> Self {
    Self {
      application:   0.4,
      magnification: 0.2,
      camera:        0.15,
      persona:       0.15,
      budget:        0.1,
    }
  }
}

impl Weights {
  /// Name/value pairs in declaration order.
  pub fn entries(&self) -> [(&'static str, f64); 5] {
    [
      ("application", self.application),
      ("magnification", self.magnification),
      ("camera", self.camera),
      ("persona", self.persona),
      ("budget", self.budget),
    ]
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored<'a> {
  pub product: &'a Product,
  pub score:   f64,
}

#[derive(Debug, Clone, Default)]
pub struct QuizEngine {
  pub weights: Weights,
}

impl QuizEngine {
  pub fn new(weights: Weights) -> Self { Self { weights } }

  pub fn score(&self, product: &Product, case: &TestCase) -> f64 {
    let w = &self.weights;
    let mut score = 0.0;

    // Application
    let wanted = sample_type(&case.sample_type, &case.sample_opacity);
    let actual = product_type(product);
    if wanted == actual {
      score += w.application;
    } else if wanted.is_transmitted() && actual.is_transmitted() {
      score += w.application * 0.5;
    }

    // Opacity
    match case.sample_opacity.as_str() {
      "opaque" if actual == MicroscopeType::Stereo => score += OPACITY_BONUS,
      "transparent" if actual.is_transmitted() => score += OPACITY_BONUS,
      _ => {}
    }

    // Camera
    let needed = case.camera_need == "yes";
    let present = has_camera(product);
    if needed == present {
      score += w.camera;
    } else if present {
      score += w.camera * 0.5;
    }

    // Magnification
    let quoted = magnification(product);
    if quoted > 0
      && let Some(target) = parse_leading_int(&case.magnification)
    {
      let gap = (quoted as f64 - target as f64).abs();
      score += w.magnification * (1.0 - (gap / MAX_MAGNIFICATION_GAP).min(1.0));
    }

    // Persona
    if let Ok(persona) = case.persona.parse::<Category>() {
      if markets_to(product, persona) {
        score += w.persona;
      } else if persona == price_bucket(product.price) {
        score += w.persona * 0.3;
      }
    }

    // Budget
    if let Some(budget) = parse_leading_int(&case.budget) {
      let budget = budget as f64;
      if product.price <= budget {
        score += w.budget;
      } else {
        let penalty = ((product.price - budget) / budget).min(1.0);
        score += w.budget * (1.0 - penalty);
      }
    }

    // Features
    if !case.special_features.is_empty() {
      let features = Product::field_lower(&product.metafields.features);
      let requested: Vec<String> = case
        .special_features
        .split('|')
        .map(|f| f.trim().to_lowercase())
        .collect();
      let matched = requested.iter().filter(|f| features.contains(f.as_str())).count();
      score += FEATURE_BONUS * matched as f64 / requested.len() as f64;
    }

    score
  }

  /// The best-scoring product. Ties go to the earliest in `products`.
  pub fn predict<'a>(&self, case: &TestCase, products: &'a [Product]) -> Option<Scored<'a>> {
    products
      .iter()
      .map(|product| Scored { product, score: self.score(product, case) })
      .fold(None, |best: Option<Scored<'a>>, next| match best {
        Some(b) if b.score >= next.score => Some(b),
        _ => Some(next),
      })
  }
}
