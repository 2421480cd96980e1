// storefront/src/services/woocommerce.rs

//! WooCommerce REST client for orders.

use crate::models::{Billing, NewOrder, Order, OrderId, OrderLine, OrderStatus};
use crate::services::commerce::{CommerceError, CommerceService};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::HOST;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const META_PAYMENT_INTENT: &str = "_payment_intent";
const META_PAYMENT_REFERENCE: &str = "_payment_reference";

#[derive(Debug, Clone)]
pub struct WooCommerceConfig {
  /// REST base, e.g. `https://shop.example/wp-json/wc/v3`.
  pub base_url: String,
  /// Sent as `Host` when the backend is reached by IP behind virtual hosting.
  pub host_header: Option<String>,
  pub consumer_key: String,
  pub consumer_secret: String,
  pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct WooCommerceClient {
  http: Client,
  config: WooCommerceConfig,
}

impl WooCommerceClient {
  pub fn new(config: WooCommerceConfig) -> Result<Self, CommerceError> {
    let http = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| CommerceError::Unreachable(format!("HTTP client setup failed: {}", e)))?;
    Ok(Self { http, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
    let builder = builder.query(&[
      ("consumer_key", self.config.consumer_key.as_str()),
      ("consumer_secret", self.config.consumer_secret.as_str()),
    ]);
    match &self.config.host_header {
      Some(host) => builder.header(HOST, host.as_str()),
      None => builder,
    }
  }

  async fn send(&self, builder: RequestBuilder) -> Result<Response, CommerceError> {
    self.authorized(builder).send().await.map_err(transport_error)
  }
}

fn transport_error(e: reqwest::Error) -> CommerceError {
  if e.is_timeout() {
    CommerceError::Timeout
  } else {
    CommerceError::Unreachable(e.to_string())
  }
}

async fn read_order(resp: Response) -> Result<Order, CommerceError> {
  let status = resp.status();
  if !status.is_success() {
    let body = resp.text().await.unwrap_or_default();
    return Err(CommerceError::Rejected {
      status: status.as_u16(),
      body,
    });
  }
  let wire = resp
    .json::<WooOrder>()
    .await
    .map_err(|e| CommerceError::Malformed(e.to_string()))?;
  wire.into_order()
}

#[async_trait]
impl CommerceService for WooCommerceClient {
  #[instrument(name = "woocommerce::create_order", skip_all, fields(lines = order.line_items.len()))]
  async fn create_order(&self, order: &NewOrder) -> Result<Order, CommerceError> {
    let body = WooNewOrder::from_new_order(order);
    let resp = self.send(self.http.post(self.url("orders")).json(&body)).await?;
    let created = read_order(resp).await?;
    debug!(order_id = %created.id, total = created.total, "Order created.");
    Ok(created)
  }

  #[instrument(name = "woocommerce::get_order", skip(self))]
  async fn get_order(&self, id: OrderId) -> Result<Option<Order>, CommerceError> {
    let resp = self.send(self.http.get(self.url(&format!("orders/{}", id)))).await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    read_order(resp).await.map(Some)
  }

  #[instrument(name = "woocommerce::update_order_status", skip(self))]
  async fn update_order_status(
    &self,
    id: OrderId,
    status: OrderStatus,
    payment_reference: Option<&str>,
  ) -> Result<Order, CommerceError> {
    let mut body = json!({ "status": status.as_str() });
    if let Some(reference) = payment_reference {
      body["meta_data"] = json!([{ "key": META_PAYMENT_REFERENCE, "value": reference }]);
    }
    let resp = self
      .send(self.http.put(self.url(&format!("orders/{}", id))).json(&body))
      .await?;
    read_order(resp).await
  }
}

// --- Wire format ---

#[derive(Debug, Default, Serialize, Deserialize)]
struct WooBilling {
  #[serde(default)]
  first_name: String,
  #[serde(default)]
  last_name: String,
  #[serde(default)]
  address_1: String,
  #[serde(default)]
  address_2: String,
  #[serde(default)]
  city: String,
  #[serde(default)]
  state: String,
  #[serde(default)]
  postcode: String,
  #[serde(default)]
  country: String,
  #[serde(default)]
  email: String,
  #[serde(default)]
  phone: String,
}

fn non_empty(s: String) -> Option<String> {
  if s.is_empty() {
    None
  } else {
    Some(s)
  }
}

impl WooBilling {
  fn from_billing(b: &Billing) -> Self {
    Self {
      first_name: b.first_name.clone(),
      last_name: b.last_name.clone(),
      address_1: b.address1.clone().unwrap_or_default(),
      address_2: b.address2.clone().unwrap_or_default(),
      city: b.city.clone().unwrap_or_default(),
      state: b.state.clone().unwrap_or_default(),
      postcode: b.postcode.clone().unwrap_or_default(),
      country: b.country.clone().unwrap_or_else(|| "KR".to_string()),
      email: b.email.clone(),
      phone: b.phone.clone(),
    }
  }

  fn into_billing(self) -> Billing {
    Billing {
      email: self.email,
      first_name: self.first_name,
      last_name: self.last_name,
      phone: self.phone,
      address1: non_empty(self.address_1),
      address2: non_empty(self.address_2),
      city: non_empty(self.city),
      state: non_empty(self.state),
      postcode: non_empty(self.postcode),
      country: non_empty(self.country),
    }
  }
}

#[derive(Debug, Serialize)]
struct WooNewLine {
  product_id: u64,
  quantity: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WooMeta {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  id: Option<u64>,
  key: String,
  #[serde(default)]
  value: Value,
}

#[derive(Debug, Serialize)]
struct WooNewOrder {
  payment_method: &'static str,
  payment_method_title: &'static str,
  set_paid: bool,
  currency: String,
  billing: WooBilling,
  line_items: Vec<WooNewLine>,
  meta_data: Vec<WooMeta>,
}

impl WooNewOrder {
  fn from_new_order(order: &NewOrder) -> Self {
    Self {
      payment_method: order.payment_method.as_str(),
      payment_method_title: order.payment_method.title(),
      // Marked paid only through reconciliation.
      set_paid: false,
      currency: order.currency.clone(),
      billing: WooBilling::from_billing(&order.billing),
      line_items: order
        .line_items
        .iter()
        .map(|l| WooNewLine {
          product_id: l.product_id,
          quantity: l.quantity,
        })
        .collect(),
      meta_data: vec![WooMeta {
        id: None,
        key: META_PAYMENT_INTENT.to_string(),
        value: Value::String("pending".to_string()),
      }],
    }
  }
}

#[derive(Debug, Deserialize)]
struct WooLine {
  #[serde(default)]
  name: String,
  product_id: u64,
  quantity: u32,
  #[serde(default)]
  total: String,
}

#[derive(Debug, Deserialize)]
struct WooOrder {
  id: u64,
  #[serde(default)]
  number: String,
  status: String,
  #[serde(default)]
  currency: String,
  total: String,
  #[serde(default)]
  date_created_gmt: Option<String>,
  #[serde(default)]
  line_items: Vec<WooLine>,
  #[serde(default)]
  billing: WooBilling,
  #[serde(default)]
  meta_data: Vec<WooMeta>,
}

/// WooCommerce sends money as decimal strings. Amounts are whole units here.
fn whole_units(raw: &str) -> Result<u64, CommerceError> {
  if raw.trim().is_empty() {
    return Ok(0);
  }
  Decimal::from_str(raw.trim())
    .ok()
    .and_then(|d| d.round().to_u64())
    .ok_or_else(|| CommerceError::Malformed(format!("invalid amount '{}'", raw)))
}

/// Maps WooCommerce's wider status set onto ours.
fn order_status(raw: &str) -> Result<OrderStatus, CommerceError> {
  match raw {
    "on-hold" | "checkout-draft" => Ok(OrderStatus::Pending),
    // Refunds are terminal for this system.
    "refunded" => Ok(OrderStatus::Cancelled),
    other => OrderStatus::from_str(other).map_err(CommerceError::Malformed),
  }
}

fn parse_gmt(raw: &str) -> Option<DateTime<Utc>> {
  NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
    .map(|n| n.and_utc())
    .map_err(|e| warn!(value = raw, error = %e, "Unparseable order timestamp ignored."))
    .ok()
}

impl WooOrder {
  fn into_order(self) -> Result<Order, CommerceError> {
    let line_items = self
      .line_items
      .into_iter()
      .map(|l| {
        Ok(OrderLine {
          product_id: l.product_id,
          name: l.name,
          quantity: l.quantity,
          total: whole_units(&l.total)?,
        })
      })
      .collect::<Result<Vec<_>, CommerceError>>()?;

    let payment_reference = self
      .meta_data
      .iter()
      .find(|m| m.key == META_PAYMENT_REFERENCE)
      .and_then(|m| m.value.as_str())
      .map(String::from);

    Ok(Order {
      id: OrderId(self.id),
      number: if self.number.is_empty() {
        self.id.to_string()
      } else {
        self.number
      },
      status: order_status(&self.status)?,
      currency: self.currency,
      total: whole_units(&self.total)?,
      line_items,
      billing: self.billing.into_billing(),
      payment_reference,
      created_at: self.date_created_gmt.as_deref().and_then(parse_gmt),
    })
  }
}
