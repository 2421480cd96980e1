// storefront/src/payments/gateway.rs

use crate::models::OrderId;
use crate::payments::eximbay::EximbayForm;
use crate::payments::portone::PortOneRequest;
use crate::payments::{PaymentMethod, PaymentReference};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  pub email: String,
  #[serde(default)]
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

/// One payment attempt for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
  pub order_id: OrderId,
  /// Whole currency units.
  pub amount: u64,
  pub currency: String,
  pub customer: Customer,
  pub reference: PaymentReference,
}

/// What the UI needs to hand the shopper over to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PaymentHandle {
  /// Auto-submitted form opened in a popup.
  Form(EximbayForm),
  /// Request object passed to the provider's browser SDK.
  Sdk(PortOneRequest),
}

/// Synchronous initiation failures. None of them changes the order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
  #[error("payment provider unreachable: {0}")]
  Unreachable(String),

  #[error("payment provider rejected the request: {0}")]
  Rejected(String),

  #[error("payment cancelled: {0}")]
  Cancelled(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn method(&self) -> PaymentMethod;

  async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentHandle, PaymentError>;
}
