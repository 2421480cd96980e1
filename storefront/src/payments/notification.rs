// storefront/src/payments/notification.rs

//! Inbound payment notifications.
//!
//! The two providers share no discriminator field, so a raw payload is
//! classified exactly once by the fields only one provider sends. Everything
//! downstream works on the typed [`ProviderNotification`].

use crate::models::{OrderId, OrderStatus};
use crate::payments::eximbay::EximbayNotification;
use crate::payments::portone::{PortOneNotification, EVENT_CANCELLED, EVENT_FAILED, EVENT_PAID};
use crate::payments::{PaymentMethod, PaymentReference, ReferenceError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
  /// Server-to-server call from the provider. Authoritative.
  Webhook,
  /// The shopper's browser coming back from the provider.
  Redirect,
}

impl NotificationChannel {
  pub fn as_str(&self) -> &'static str {
    match self {
      NotificationChannel::Webhook => "webhook",
      NotificationChannel::Redirect => "redirect",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawNotification {
  pub channel: NotificationChannel,
  pub payload: Map<String, Value>,
}

impl RawNotification {
  pub fn webhook(payload: Map<String, Value>) -> Self {
    Self {
      channel: NotificationChannel::Webhook,
      payload,
    }
  }

  /// Query parameters become a JSON object of strings.
  pub fn redirect(query: HashMap<String, String>) -> Self {
    let payload = query.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
    Self {
      channel: NotificationChannel::Redirect,
      payload,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
  #[error("payload matches no known payment provider")]
  UnknownProvider,

  #[error("{provider} notification is malformed: {reason}")]
  Malformed { provider: PaymentMethod, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderNotification {
  Eximbay(EximbayNotification),
  PortOne(PortOneNotification),
}

fn portone_payment_id(payload: &Map<String, Value>) -> Option<&Value> {
  payload
    .get("paymentId")
    .or_else(|| payload.get("data").and_then(|d| d.get("paymentId")))
}

fn optional_str(value: Option<&Value>) -> Option<String> {
  value.and_then(Value::as_str).map(String::from)
}

pub fn classify(raw: &RawNotification) -> Result<ProviderNotification, ClassifyError> {
  let payload = &raw.payload;
  let looks_eximbay = payload.contains_key("rescode") || payload.contains_key("fgkey");
  let portone_id = portone_payment_id(payload);

  match (looks_eximbay, portone_id) {
    (true, None) => serde_json::from_value::<EximbayNotification>(Value::Object(payload.clone()))
      .map(ProviderNotification::Eximbay)
      .map_err(|e| ClassifyError::Malformed {
        provider: PaymentMethod::Eximbay,
        reason: e.to_string(),
      }),
    (false, Some(id)) => {
      let payment_id = id.as_str().ok_or_else(|| ClassifyError::Malformed {
        provider: PaymentMethod::PortOne,
        reason: "paymentId must be a string".to_string(),
      })?;
      let data = payload.get("data");
      Ok(ProviderNotification::PortOne(PortOneNotification {
        payment_id: payment_id.to_string(),
        event_type: optional_str(payload.get("type")),
        transaction_id: optional_str(data.and_then(|d| d.get("transactionId")).or_else(|| payload.get("txId"))),
        code: optional_str(payload.get("code")),
        message: optional_str(payload.get("message")),
      }))
    }
    _ => Err(ClassifyError::UnknownProvider),
  }
}

impl ProviderNotification {
  pub fn provider(&self) -> PaymentMethod {
    match self {
      ProviderNotification::Eximbay(_) => PaymentMethod::Eximbay,
      ProviderNotification::PortOne(_) => PaymentMethod::PortOne,
    }
  }

  /// The status this notification asks for, or `None` when it should not
  /// move the order. Redirects can only report progress; failures and
  /// cancellations are taken from webhooks alone.
  pub fn status_intent(&self, channel: NotificationChannel) -> Option<OrderStatus> {
    use NotificationChannel::*;

    match (self, channel) {
      (ProviderNotification::Eximbay(n), Webhook) => Some(if n.is_success() {
        OrderStatus::Completed
      } else {
        OrderStatus::Failed
      }),
      (ProviderNotification::Eximbay(n), Redirect) => n.is_success().then_some(OrderStatus::Processing),
      (ProviderNotification::PortOne(n), Webhook) => match n.event_type.as_deref() {
        Some(EVENT_PAID) => Some(OrderStatus::Completed),
        Some(EVENT_FAILED) => Some(OrderStatus::Failed),
        Some(EVENT_CANCELLED) => Some(OrderStatus::Cancelled),
        _ => None,
      },
      (ProviderNotification::PortOne(n), Redirect) => n.code.is_none().then_some(OrderStatus::Processing),
    }
  }

  /// Eximbay carries the order id directly in `ref`; PortOne embeds it in
  /// the payment reference.
  pub fn order_id(&self) -> Result<OrderId, ReferenceError> {
    match self {
      ProviderNotification::Eximbay(n) => {
        let r = n.reference.trim();
        if r.is_empty() {
          return Err(ReferenceError::Empty { part: "order id" });
        }
        if !r.bytes().all(|b| b.is_ascii_digit()) {
          return Err(ReferenceError::NotDigits { part: "order id" });
        }
        r.parse::<OrderId>()
          .map_err(|_| ReferenceError::Overflow { part: "order id" })
      }
      ProviderNotification::PortOne(n) => n.payment_id.parse::<PaymentReference>().map(|r| r.order_id),
    }
  }

  /// The attempt this notification belongs to, when the provider says.
  pub fn payment_reference(&self) -> Option<String> {
    match self {
      ProviderNotification::Eximbay(n) => n.param1.clone().filter(|p| !p.is_empty()),
      ProviderNotification::PortOne(n) => Some(n.payment_id.clone()),
    }
  }
}
