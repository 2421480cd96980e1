// storefront/src/services/memory_commerce.rs

//! Commerce backend held in memory, for local runs and tests.

use crate::models::{NewOrder, Order, OrderId, OrderLine, OrderStatus};
use crate::services::commerce::{CommerceError, CommerceService};
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

const FIRST_ORDER_ID: u64 = 1000;

#[derive(Debug)]
pub struct InMemoryCommerce {
  orders: Mutex<BTreeMap<OrderId, Order>>,
  next_id: AtomicU64,
  tax_rate: Option<Decimal>,
  latency: Option<Duration>,
  failure: Mutex<Option<CommerceError>>,
  create_calls: AtomicUsize,
  update_calls: AtomicUsize,
}

impl Default for InMemoryCommerce {
  fn default() -> Self {
    Self::new()
  }
}

impl InMemoryCommerce {
  pub fn new() -> Self {
    Self {
      orders: Mutex::new(BTreeMap::new()),
      next_id: AtomicU64::new(FIRST_ORDER_ID),
      tax_rate: None,
      latency: None,
      failure: Mutex::new(None),
      create_calls: AtomicUsize::new(0),
      update_calls: AtomicUsize::new(0),
    }
  }

  /// Flat rate applied to the subtotal, e.g. `Decimal::new(10, 2)` for 10%.
  pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
    self.tax_rate = Some(rate);
    self
  }

  /// Delay every call, to exercise caller timeouts.
  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = Some(latency);
    self
  }

  /// Every following call fails with `error` until cleared with `None`.
  pub fn fail_with(&self, error: Option<CommerceError>) {
    *self.failure.lock() = error;
  }

  pub fn create_calls(&self) -> usize {
    self.create_calls.load(Ordering::SeqCst)
  }

  pub fn update_calls(&self) -> usize {
    self.update_calls.load(Ordering::SeqCst)
  }

  pub fn order(&self, id: OrderId) -> Option<Order> {
    self.orders.lock().get(&id).cloned()
  }

  pub fn order_count(&self) -> usize {
    self.orders.lock().len()
  }

  async fn simulate_call(&self) -> Result<(), CommerceError> {
    if let Some(latency) = self.latency {
      tokio::time::sleep(latency).await;
    }
    let failure = self.failure.lock().clone();
    match failure {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }

  fn tax_on(&self, subtotal: u64) -> u64 {
    self
      .tax_rate
      .and_then(|rate| (Decimal::from(subtotal) * rate).round().to_u64())
      .unwrap_or(0)
  }
}

#[async_trait]
impl CommerceService for InMemoryCommerce {
  async fn create_order(&self, new_order: &NewOrder) -> Result<Order, CommerceError> {
    self.create_calls.fetch_add(1, Ordering::SeqCst);
    self.simulate_call().await?;

    let id = OrderId(self.next_id.fetch_add(1, Ordering::SeqCst));
    let subtotal = new_order.subtotal();
    let order = Order {
      id,
      number: id.to_string(),
      status: OrderStatus::Pending,
      currency: new_order.currency.clone(),
      total: subtotal + self.tax_on(subtotal),
      line_items: new_order
        .line_items
        .iter()
        .map(|l| OrderLine {
          product_id: l.product_id,
          name: l.name.clone(),
          quantity: l.quantity,
          total: l.unit_price.saturating_mul(u64::from(l.quantity)),
        })
        .collect(),
      billing: new_order.billing.clone(),
      payment_reference: None,
      created_at: Some(chrono::Utc::now()),
    };
    self.orders.lock().insert(id, order.clone());
    info!(order_id = %id, total = order.total, "In-memory order created.");
    Ok(order)
  }

  async fn get_order(&self, id: OrderId) -> Result<Option<Order>, CommerceError> {
    self.simulate_call().await?;
    Ok(self.order(id))
  }

  async fn update_order_status(
    &self,
    id: OrderId,
    status: OrderStatus,
    payment_reference: Option<&str>,
  ) -> Result<Order, CommerceError> {
    self.update_calls.fetch_add(1, Ordering::SeqCst);
    self.simulate_call().await?;

    let mut orders = self.orders.lock();
    let order = orders.get_mut(&id).ok_or_else(|| CommerceError::Rejected {
      status: 404,
      body: format!("order {} does not exist", id),
    })?;
    order.status = status;
    if let Some(reference) = payment_reference {
      order.payment_reference = Some(reference.to_string());
    }
    Ok(order.clone())
  }
}
