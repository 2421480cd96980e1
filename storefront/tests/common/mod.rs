// storefront/tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storefront::cart::CartSnapshot;
use storefront::models::{Billing, NewCartItem, OrderId};
use storefront::orchestrator::{Collaborators, Orchestrator, OrchestratorSettings, OrderSummary, PaymentGateways};
use storefront::payments::checksum::eximbay_fgkey;
use storefront::payments::eximbay::{EximbayConfig, EximbayGateway};
use storefront::payments::portone::{PortOneConfig, PortOneGateway};
use storefront::payments::{PaymentMethod, PaymentReference, RawNotification};
use storefront::services::{InMemoryCommerce, OrderLocks};
use tracing::Level;

pub const SECRET: &str = "test_secret";
pub const CALLBACK_URL: &str = "http://shop.test/api/v1/payment/webhook";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub struct Harness {
  pub orchestrator: Orchestrator,
  pub commerce: Arc<InMemoryCommerce>,
}

/// Collaborators over `commerce` with both gateways configured.
pub fn collaborators(commerce: Arc<InMemoryCommerce>) -> Collaborators {
  let gateways = PaymentGateways::new()
    .with(Arc::new(EximbayGateway::new(EximbayConfig {
      mid: "TEST_MID".to_string(),
      secret_key: SECRET.to_string(),
      api_url: "https://api-test.eximbay.com".to_string(),
      callback_url: CALLBACK_URL.to_string(),
    })))
    .with(Arc::new(PortOneGateway::new(PortOneConfig {
      store_id: Some("store-test".to_string()),
      channel_key: Some("channel-key-test".to_string()),
      redirect_url: CALLBACK_URL.to_string(),
      notice_url: CALLBACK_URL.to_string(),
    })));

  Collaborators {
    commerce,
    gateways,
    locks: OrderLocks::new(),
    settings: OrchestratorSettings {
      currency: "KRW".to_string(),
      external_timeout: Duration::from_secs(1),
      retry_policy: Default::default(),
      eximbay_secret: SECRET.to_string(),
    },
  }
}

pub fn harness() -> Harness {
  harness_from(InMemoryCommerce::new(), |_| {})
}

pub fn harness_from(commerce: InMemoryCommerce, tweak: impl FnOnce(&mut Collaborators)) -> Harness {
  setup_tracing();
  let commerce = Arc::new(commerce);
  let mut deps = collaborators(Arc::clone(&commerce));
  tweak(&mut deps);
  Harness {
    orchestrator: Orchestrator::new(deps),
    commerce,
  }
}

pub fn valid_billing() -> Billing {
  Billing {
    email: "kim@example.com".to_string(),
    first_name: "Minji".to_string(),
    last_name: "Kim".to_string(),
    phone: "010-1234-5678".to_string(),
    ..Default::default()
  }
}

/// `(product_id, unit_price, quantity)` lines.
pub fn cart_of(lines: &[(u64, u64, u32)]) -> CartSnapshot {
  CartSnapshot::from_items(
    lines
      .iter()
      .map(|&(id, price, qty)| NewCartItem::new(id, format!("eSIM {}", id), format!("esim-{}", id), price).with_quantity(qty))
      .collect(),
  )
}

/// A pending order worth 55000 KRW.
pub async fn pending_order(h: &Harness) -> OrderSummary {
  h.orchestrator
    .create_order(cart_of(&[(1, 25_000, 1), (2, 15_000, 2)]), valid_billing(), PaymentMethod::Eximbay)
    .await
    .expect("order should be created")
}

pub fn reference(order_id: OrderId, ms: u64) -> String {
  PaymentReference::new(order_id, ms).encode()
}

fn object(v: Value) -> Map<String, Value> {
  match v {
    Value::Object(map) => map,
    _ => panic!("notification payload must be an object"),
  }
}

/// Eximbay status fields signed with [`SECRET`].
pub fn eximbay_fields(order_id: OrderId, rescode: &str, amt: &str, cur: &str) -> Map<String, Value> {
  let r = order_id.to_string();
  object(json!({
    "ref": r,
    "rescode": rescode,
    "resmsg": if rescode == "0000" { "Success" } else { "Declined" },
    "cur": cur,
    "amt": amt,
    "transid": "EX-TX-1",
    "fgkey": eximbay_fgkey(SECRET, &r, cur, amt),
    "param1": reference(order_id, 1_700_000_000_000),
  }))
}

pub fn eximbay_webhook(order_id: OrderId, rescode: &str) -> RawNotification {
  RawNotification::webhook(eximbay_fields(order_id, rescode, "55000", "KRW"))
}

pub fn eximbay_redirect(order_id: OrderId, rescode: &str) -> RawNotification {
  let query: HashMap<String, String> = eximbay_fields(order_id, rescode, "55000", "KRW")
    .into_iter()
    .map(|(k, v)| (k, v.as_str().unwrap_or_default().to_string()))
    .collect();
  RawNotification::redirect(query)
}

pub fn portone_webhook(payment_id: &str, event_type: &str) -> RawNotification {
  RawNotification::webhook(object(json!({
    "type": event_type,
    "timestamp": "2024-05-01T09:30:00Z",
    "data": {"paymentId": payment_id, "transactionId": "pt-tx-1", "storeId": "store-test"}
  })))
}

pub fn portone_redirect(payment_id: &str, code: Option<&str>) -> RawNotification {
  let mut query = HashMap::new();
  query.insert("paymentId".to_string(), payment_id.to_string());
  if let Some(code) = code {
    query.insert("code".to_string(), code.to_string());
    query.insert("message".to_string(), "Payment was not completed".to_string());
  }
  RawNotification::redirect(query)
}
