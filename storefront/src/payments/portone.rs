// storefront/src/payments/portone.rs

use crate::payments::gateway::{PaymentError, PaymentGateway, PaymentHandle, PaymentRequest};
use crate::payments::PaymentMethod;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument};

pub const EVENT_PAID: &str = "Transaction.Paid";
pub const EVENT_FAILED: &str = "Transaction.Failed";
pub const EVENT_CANCELLED: &str = "Transaction.Cancelled";

#[derive(Debug, Clone, Default)]
pub struct PortOneConfig {
  pub store_id: Option<String>,
  pub channel_key: Option<String>,
  /// Browser redirect target after the SDK window closes.
  pub redirect_url: String,
  /// Server-to-server webhook target.
  pub notice_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortOneCustomer {
  pub email: String,
  pub full_name: String,
}

/// Argument of the browser SDK's `requestPayment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortOneRequest {
  pub store_id: String,
  pub channel_key: String,
  pub payment_id: String,
  pub order_name: String,
  pub total_amount: u64,
  pub currency: String,
  pub pay_method: String,
  pub customer: PortOneCustomer,
  pub redirect_url: String,
  pub notice_urls: Vec<String>,
}

pub struct PortOneGateway {
  config: PortOneConfig,
}

impl PortOneGateway {
  pub fn new(config: PortOneConfig) -> Self {
    Self { config }
  }
}

fn configured(value: &Option<String>) -> Option<String> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

#[async_trait]
impl PaymentGateway for PortOneGateway {
  fn method(&self) -> PaymentMethod {
    PaymentMethod::PortOne
  }

  #[instrument(name = "portone::initiate", skip_all, fields(order_id = %request.order_id, amount = request.amount))]
  async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentHandle, PaymentError> {
    let (Some(store_id), Some(channel_key)) = (configured(&self.config.store_id), configured(&self.config.channel_key))
    else {
      return Err(PaymentError::Rejected(
        "PortOne store id and channel key are not configured".to_string(),
      ));
    };

    let sdk_request = PortOneRequest {
      store_id,
      channel_key,
      payment_id: request.reference.encode(),
      order_name: format!("82Mobile Order #{}", request.order_id),
      total_amount: request.amount,
      currency: format!("CURRENCY_{}", request.currency),
      pay_method: "CARD".to_string(),
      customer: PortOneCustomer {
        email: request.customer.email.clone(),
        full_name: request.customer.name.clone(),
      },
      redirect_url: self.config.redirect_url.clone(),
      notice_urls: vec![self.config.notice_url.clone()],
    };

    info!(payment_id = %sdk_request.payment_id, "PortOne SDK request prepared.");
    Ok(PaymentHandle::Sdk(sdk_request))
  }
}

/// A PortOne webhook (`{"type", "data": {"paymentId", ..}}`) or browser
/// redirect (`paymentId`, plus `code`/`message` on failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortOneNotification {
  pub payment_id: String,
  pub event_type: Option<String>,
  pub transaction_id: Option<String>,
  /// Present on a redirect when the shopper did not complete payment.
  pub code: Option<String>,
  pub message: Option<String>,
}
