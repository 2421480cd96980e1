// storefront/src/cart/analytics.rs

use crate::models::CartLineItem;

/// Receives cart signals for analytics. Failures never affect the cart.
pub trait CartEvents: Send + Sync {
  /// `quantity` is the amount just added, not the line's new total.
  fn item_added(&self, line: &CartLineItem, quantity: u32) -> anyhow::Result<()>;
}

/// Emits `add_to_cart` events on the `analytics` tracing target.
#[derive(Debug, Clone)]
pub struct TracingCartEvents {
  currency: String,
}

impl TracingCartEvents {
  pub fn new(currency: impl Into<String>) -> Self {
    Self {
      currency: currency.into(),
    }
  }
}

impl Default for TracingCartEvents {
  fn default() -> Self {
    Self::new("KRW")
  }
}

impl CartEvents for TracingCartEvents {
  fn item_added(&self, line: &CartLineItem, quantity: u32) -> anyhow::Result<()> {
    let value = line.unit_price.saturating_mul(u64::from(quantity));
    tracing::info!(
      target: "analytics",
      event = "add_to_cart",
      currency = %self.currency,
      value,
      item_id = line.product_id,
      item_name = %line.name,
      price = line.unit_price,
      quantity,
    );
    Ok(())
  }
}
