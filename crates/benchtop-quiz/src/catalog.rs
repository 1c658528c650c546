//! Product catalog loading.
//!
//! Accepts a JSON array of products, an object with a `products` array, or a
//! single product object. Prices may be a number, a numeric string, or
//! absent with a Storefront-style `priceRange.minVariantPrice.amount`.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Free-text attributes the scoring rules look at.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Metafields {
  pub features:           Option<String>,
  pub applications:       Option<String>,
  pub specs:              Option<String>,
  pub equipment_category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
  pub id:         String,
  pub title:      String,
  pub handle:     String,
  pub price:      f64,
  pub metafields: Metafields,
}

impl Product {
  pub fn title_lower(&self) -> String { self.title.to_lowercase() }

  pub(crate) fn field_lower(field: &Option<String>) -> String {
    field.as_deref().unwrap_or_default().to_lowercase()
  }
}

// ─── Raw shape ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MinVariantPrice {
  amount: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PriceRange {
  min_variant_price: Option<MinVariantPrice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawProduct {
  id:          Option<Value>,
  title:       Option<String>,
  handle:      Option<String>,
  price:       Option<Value>,
  price_range: Option<PriceRange>,
  metafields:  Option<Metafields>,
}

fn number(v: &Value) -> Option<f64> {
  match v {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

impl From<RawProduct> for Product {
  fn from(raw: RawProduct) -> Self {
    let listed = raw.price.as_ref().and_then(number).filter(|p| *p != 0.0);
    let fallback = raw
      .price_range
      .and_then(|r| r.min_variant_price)
      .and_then(|p| p.amount)
      .and_then(|a| a.trim().parse().ok());

    Product {
      id:         match raw.id {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
      },
      title:      raw.title.unwrap_or_default(),
      handle:     raw.handle.unwrap_or_default(),
      price:      listed.or(fallback).unwrap_or(0.0),
      metafields: raw.metafields.unwrap_or_default(),
    }
  }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Parse a product export from JSON text.
pub fn parse_products(json: &str) -> Result<Vec<Product>> {
  let data: Value = serde_json::from_str(json)?;
  let items = match data {
    Value::Array(items) => items,
    Value::Object(mut map) => match map.remove("products") {
      Some(Value::Array(items)) => items,
      _ => vec![Value::Object(map)],
    },
    other => vec![other],
  };

  items
    .into_iter()
    .map(|item| Ok(Product::from(serde_json::from_value::<RawProduct>(item)?)))
    .collect()
}

/// Read and parse a product export from disk.
pub fn load_products(path: &Path) -> Result<Vec<Product>> {
  let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.display().to_string(),
    source,
  })?;
  let products = parse_products(&text)?;
  tracing::info!(count = products.len(), ?path, "loaded products");
  Ok(products)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_array_wrapper_and_single_object() {
    let array = r#"[{"id":"1","title":"A","handle":"a","price":10}]"#;
    let wrapped = r#"{"products":[{"id":"1","title":"A"},{"id":"2","title":"B"}]}"#;
    let single = r#"{"id":"gid://shopify/Product/7","title":"Solo"}"#;

    assert_eq!(parse_products(array).unwrap().len(), 1);
    assert_eq!(parse_products(wrapped).unwrap().len(), 2);
    let solo = parse_products(single).unwrap();
    assert_eq!(solo.len(), 1);
    assert_eq!(solo[0].id, "gid://shopify/Product/7");
  }

  #[test]
  fn price_falls_back_to_min_variant_amount() {
    let json = r#"[
      {"title":"Listed","price":499.5},
      {"title":"Ranged","priceRange":{"minVariantPrice":{"amount":"1299.00"}}},
      {"title":"Zero","price":0,"priceRange":{"minVariantPrice":{"amount":"42"}}},
      {"title":"Unpriced"}
    ]"#;
    let prices: Vec<f64> = parse_products(json).unwrap().iter().map(|p| p.price).collect();
    assert_eq!(prices, [499.5, 1299.0, 42.0, 0.0]);
  }

  #[test]
  fn missing_metafields_default_to_empty() {
    let json = r#"[{"title":"Bare"},{"title":"Tagged","metafields":{"features":"USB camera","specs":null}}]"#;
    let products = parse_products(json).unwrap();
    assert_eq!(products[0].metafields, Metafields::default());
    assert_eq!(products[1].metafields.features.as_deref(), Some("USB camera"));
    assert!(products[1].metafields.specs.is_none());
  }
}
