// storefront/src/models/cart_item.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Item descriptor passed to `CartStore::add_item`: everything but the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
  pub product_id: u64,
  pub name: String,
  pub slug: String,
  /// Whole currency units (KRW has no minor unit).
  #[serde(rename = "price")]
  pub unit_price: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub attributes: BTreeMap<String, String>,
}

impl NewCartItem {
  pub fn new(product_id: u64, name: impl Into<String>, slug: impl Into<String>, unit_price: u64) -> Self {
    Self {
      product_id,
      name: name.into(),
      slug: slug.into(),
      unit_price,
      image: None,
      attributes: BTreeMap::new(),
    }
  }

  pub fn with_quantity(self, quantity: u32) -> CartLineItem {
    CartLineItem {
      product_id: self.product_id,
      name: self.name,
      slug: self.slug,
      unit_price: self.unit_price,
      quantity,
      image: self.image,
      attributes: self.attributes,
    }
  }
}

/// One line of the cart. Serialized with the same keys the storefront UI persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
  pub product_id: u64,
  pub name: String,
  pub slug: String,
  #[serde(rename = "price")]
  pub unit_price: u64,
  pub quantity: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub attributes: BTreeMap<String, String>,
}

impl CartLineItem {
  pub fn line_total(&self) -> u64 {
    self.unit_price.saturating_mul(u64::from(self.quantity))
  }
}
