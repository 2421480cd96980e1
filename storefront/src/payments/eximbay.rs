// storefront/src/payments/eximbay.rs

use crate::payments::checksum::eximbay_fgkey;
use crate::payments::gateway::{PaymentError, PaymentGateway, PaymentHandle, PaymentRequest};
use crate::payments::PaymentMethod;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};

pub const SUPPORTED_CURRENCIES: [&str; 6] = ["KRW", "USD", "CNY", "JPY", "EUR", "GBP"];

/// Result code for an approved transaction.
pub const SUCCESS_CODE: &str = "0000";

const PRODUCT_NAME: &str = "82Mobile SIM Card";

#[derive(Debug, Clone)]
pub struct EximbayConfig {
  pub mid: String,
  pub secret_key: String,
  pub api_url: String,
  /// Receives both the browser return and the server status call.
  pub callback_url: String,
}

/// Popup form posted to the Eximbay gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EximbayForm {
  pub action_url: String,
  pub fields: BTreeMap<String, String>,
}

pub struct EximbayGateway {
  config: EximbayConfig,
}

impl EximbayGateway {
  pub fn new(config: EximbayConfig) -> Self {
    Self { config }
  }

  pub fn supports_currency(currency: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&currency)
  }
}

#[async_trait]
impl PaymentGateway for EximbayGateway {
  fn method(&self) -> PaymentMethod {
    PaymentMethod::Eximbay
  }

  #[instrument(name = "eximbay::initiate", skip_all, fields(order_id = %request.order_id, amount = request.amount))]
  async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentHandle, PaymentError> {
    if self.config.mid.is_empty() || self.config.secret_key.is_empty() {
      return Err(PaymentError::Rejected("Eximbay merchant credentials are not configured".to_string()));
    }
    if !Self::supports_currency(&request.currency) {
      return Err(PaymentError::Rejected(format!(
        "currency {} is not supported by Eximbay",
        request.currency
      )));
    }

    // The order id travels as `ref` so the checksum covers it.
    let reference = request.order_id.to_string();
    let amount = request.amount.to_string();
    let fgkey = eximbay_fgkey(&self.config.secret_key, &reference, &request.currency, &amount);
    let buyer = if request.customer.name.trim().is_empty() {
      request.customer.email.clone()
    } else {
      request.customer.name.clone()
    };

    let fields: BTreeMap<String, String> = [
      ("mid", self.config.mid.clone()),
      ("ref", reference),
      ("cur", request.currency.clone()),
      ("amt", amount),
      ("buyer", buyer),
      ("email", request.customer.email.clone()),
      ("tel", request.customer.phone.clone().unwrap_or_default()),
      ("displaytype", "P".to_string()),
      ("ver", "230".to_string()),
      ("returnurl", self.config.callback_url.clone()),
      ("statusurl", self.config.callback_url.clone()),
      ("product", PRODUCT_NAME.to_string()),
      ("lang", "EN".to_string()),
      ("charset", "UTF-8".to_string()),
      ("param1", request.reference.encode()),
      ("fgkey", fgkey),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    info!(payment_reference = %request.reference, "Eximbay popup form prepared.");
    Ok(PaymentHandle::Form(EximbayForm {
      action_url: format!("{}/gateway/direct.html", self.config.api_url.trim_end_matches('/')),
      fields,
    }))
  }
}

/// Fields Eximbay posts back (status call) or appends (browser return).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EximbayNotification {
  #[serde(rename = "ref", deserialize_with = "string_or_number")]
  pub reference: String,
  pub rescode: String,
  #[serde(default)]
  pub resmsg: Option<String>,
  #[serde(default)]
  pub cur: Option<String>,
  #[serde(default, deserialize_with = "opt_string_or_number")]
  pub amt: Option<String>,
  #[serde(default)]
  pub authcode: Option<String>,
  #[serde(default)]
  pub transid: Option<String>,
  #[serde(default)]
  pub fgkey: Option<String>,
  /// Payment reference of the attempt, echoed back from the form.
  #[serde(default)]
  pub param1: Option<String>,
}

impl EximbayNotification {
  pub fn is_success(&self) -> bool {
    self.rescode == SUCCESS_CODE
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
  Str(String),
  Num(serde_json::Number),
}

impl From<StringOrNumber> for String {
  fn from(v: StringOrNumber) -> Self {
    match v {
      StringOrNumber::Str(s) => s,
      StringOrNumber::Num(n) => n.to_string(),
    }
  }
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
  StringOrNumber::deserialize(de).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
  Option::<StringOrNumber>::deserialize(de).map(|v| v.map(String::from))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::OrderId;
  use crate::payments::{Customer, PaymentReference};

  fn gateway() -> EximbayGateway {
    EximbayGateway::new(EximbayConfig {
      mid: "mid_1".to_string(),
      secret_key: "test_secret".to_string(),
      api_url: "https://api-test.eximbay.com/".to_string(),
      callback_url: "https://shop.test/api/v1/payment/webhook".to_string(),
    })
  }

  fn request(currency: &str) -> PaymentRequest {
    PaymentRequest {
      order_id: OrderId(1001),
      amount: 55000,
      currency: currency.to_string(),
      customer: Customer {
        email: "kim@example.com".to_string(),
        name: "Kim Minji".to_string(),
        phone: None,
      },
      reference: PaymentReference::new(OrderId(1001), 1_700_000_000_000),
    }
  }

  #[tokio::test]
  async fn form_carries_order_and_checksum() {
    let handle = gateway().initiate(&request("KRW")).await.unwrap();
    let PaymentHandle::Form(form) = handle else {
      panic!("expected a form handle");
    };
    assert_eq!(form.action_url, "https://api-test.eximbay.com/gateway/direct.html");
    assert_eq!(form.fields["ref"], "1001");
    assert_eq!(form.fields["amt"], "55000");
    assert_eq!(form.fields["param1"], "order_1001_1700000000000");
    assert_eq!(
      form.fields["fgkey"],
      "6eebe3ee8a84928d825df8a8d359d4ea8fd9b3df4f5bc9dba6b4de882112f7ad"
    );
  }

  #[tokio::test]
  async fn unsupported_currency_is_rejected() {
    let err = gateway().initiate(&request("THB")).await.unwrap_err();
    assert!(matches!(err, PaymentError::Rejected(_)));
  }

  #[test]
  fn amount_may_arrive_as_number() {
    let n: EximbayNotification = serde_json::from_value(serde_json::json!({
      "ref": 1001, "rescode": "0000", "cur": "KRW", "amt": 55000, "fgkey": "ab"
    }))
    .unwrap();
    assert_eq!(n.reference, "1001");
    assert_eq!(n.amt.as_deref(), Some("55000"));
    assert!(n.is_success());
  }
}
