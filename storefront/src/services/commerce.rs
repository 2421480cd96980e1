// storefront/src/services/commerce.rs

use crate::models::{NewOrder, Order, OrderId, OrderStatus};
use async_trait::async_trait;
use thiserror::Error;

/// Failures talking to the commerce platform. A successful lookup that finds
/// nothing is `Ok(None)`, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommerceError {
  #[error("commerce service unreachable: {0}")]
  Unreachable(String),

  #[error("commerce service timed out")]
  Timeout,

  #[error("commerce service rejected the request ({status}): {body}")]
  Rejected { status: u16, body: String },

  #[error("commerce service returned an unexpected payload: {0}")]
  Malformed(String),
}

/// The commerce platform that owns orders.
#[async_trait]
pub trait CommerceService: Send + Sync {
  /// Persists a new `pending` order. Either the whole order exists afterwards
  /// or none does.
  async fn create_order(&self, order: &NewOrder) -> Result<Order, CommerceError>;

  async fn get_order(&self, id: OrderId) -> Result<Option<Order>, CommerceError>;

  /// Writes `status`, and records `payment_reference` when given.
  async fn update_order_status(
    &self,
    id: OrderId,
    status: OrderStatus,
    payment_reference: Option<&str>,
  ) -> Result<Order, CommerceError>;
}
