// storefront/src/orchestrator.rs

//! Order/payment orchestration: checkout, payment initiation and
//! reconciliation of provider notifications, each run as a `flow` pipeline.

use crate::cart::CartSnapshot;
use crate::errors::{AppError, Result};
use crate::models::{Billing, Order, OrderId, OrderStatus, ReconcileOutcome, RetryPolicy};
use crate::payments::{Customer, PaymentError, PaymentGateway, PaymentHandle, PaymentMethod, PaymentReference, RawNotification};
use crate::pipelines;
use crate::pipelines::contexts::{CheckoutCtxData, PaymentCtxData, ReconcileCtxData};
use crate::services::{CommerceService, OrderLocks};
use flow::{ContextData, PipelineResult, Workflows};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
  pub currency: String,
  /// Upper bound for every call to the commerce platform or a provider.
  pub external_timeout: Duration,
  pub retry_policy: RetryPolicy,
  pub eximbay_secret: String,
}

/// Gateways keyed by the method they serve.
#[derive(Default, Clone)]
pub struct PaymentGateways {
  by_method: HashMap<PaymentMethod, Arc<dyn PaymentGateway>>,
}

impl PaymentGateways {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
    self.by_method.insert(gateway.method(), gateway);
    self
  }

  pub fn get(&self, method: PaymentMethod) -> std::result::Result<Arc<dyn PaymentGateway>, PaymentError> {
    self
      .by_method
      .get(&method)
      .cloned()
      .ok_or_else(|| PaymentError::Rejected(format!("payment method {} is not enabled", method)))
  }
}

/// Everything the pipelines call out to.
pub struct Collaborators {
  pub commerce: Arc<dyn CommerceService>,
  pub gateways: PaymentGateways,
  pub locks: OrderLocks,
  pub settings: OrchestratorSettings,
}

/// Runs `fut` under the external-call timeout.
pub(crate) async fn bounded<T>(what: &'static str, limit: Duration, fut: impl Future<Output = T>) -> Result<T> {
  tokio::time::timeout(limit, fut).await.map_err(|_| {
    warn!(target_service = what, timeout_ms = limit.as_millis() as u64, "External call timed out.");
    AppError::Timeout(what)
  })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
  pub order_id: OrderId,
  pub order_number: String,
  pub total: u64,
  pub currency: String,
  pub status: OrderStatus,
}

impl From<&Order> for OrderSummary {
  fn from(order: &Order) -> Self {
    Self {
      order_id: order.id,
      order_number: order.number.clone(),
      total: order.total,
      currency: order.currency.clone(),
      status: order.status,
    }
  }
}

#[derive(Debug, Clone)]
pub struct PaymentInitiation {
  pub order_id: OrderId,
  pub amount: u64,
  pub currency: String,
  pub customer: Customer,
  pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
  pub order_id: OrderId,
  pub payment_reference: String,
  pub handle: PaymentHandle,
}

pub struct Orchestrator {
  workflows: Workflows<AppError>,
  deps: Arc<Collaborators>,
}

impl Orchestrator {
  pub fn new(deps: Collaborators) -> Self {
    let workflows = Workflows::<AppError>::new();
    pipelines::register_all_pipelines(&workflows);
    Self {
      workflows,
      deps: Arc::new(deps),
    }
  }

  pub fn settings(&self) -> &OrchestratorSettings {
    &self.deps.settings
  }

  /// Creates a `pending` order from `cart`. Nothing reaches the commerce
  /// platform unless the cart and billing details are valid.
  #[instrument(name = "Orchestrator::create_order", skip_all, fields(lines = cart.items.len(), method = %method))]
  pub async fn create_order(&self, cart: CartSnapshot, billing: Billing, method: PaymentMethod) -> Result<OrderSummary> {
    let ctx = ContextData::new(CheckoutCtxData {
      deps: Arc::clone(&self.deps),
      cart,
      billing,
      payment_method: method,
      order_request: None,
      created_order: None,
    });

    match self.workflows.run(ctx.clone()).await? {
      PipelineResult::Completed => {}
      PipelineResult::Stopped => return Err(AppError::Internal("Checkout was halted before an order existed.".to_string())),
    }
    let guard = ctx.read();
    let order = guard
      .created_order
      .as_ref()
      .ok_or_else(|| AppError::Internal("Checkout completed without an order.".to_string()))?;
    info!(order_id = %order.id, total = order.total, "Checkout order ready for payment.");
    Ok(OrderSummary::from(order))
  }

  /// Starts a charge. A failure here never changes the order.
  #[instrument(name = "Orchestrator::initiate_payment", skip_all, fields(order_id = %request.order_id, method = %request.method))]
  pub async fn initiate_payment(&self, request: PaymentInitiation) -> Result<PaymentSession> {
    self.start_payment(request, None).await
  }

  /// Like [`Orchestrator::initiate_payment`] with a caller-chosen reference.
  pub async fn initiate_payment_with_reference(
    &self,
    request: PaymentInitiation,
    reference: PaymentReference,
  ) -> Result<PaymentSession> {
    self.start_payment(request, Some(reference)).await
  }

  async fn start_payment(&self, request: PaymentInitiation, reference: Option<PaymentReference>) -> Result<PaymentSession> {
    let order_id = request.order_id;
    let ctx = ContextData::new(PaymentCtxData {
      deps: Arc::clone(&self.deps),
      order_id,
      amount: request.amount,
      currency: request.currency,
      customer: request.customer,
      method: request.method,
      reference,
      handle: None,
    });

    self.workflows.run(ctx.clone()).await?;
    let guard = ctx.read();
    match (&guard.reference, &guard.handle) {
      (Some(reference), Some(handle)) => Ok(PaymentSession {
        order_id,
        payment_reference: reference.encode(),
        handle: handle.clone(),
      }),
      _ => Err(AppError::Internal("Payment pipeline finished without a handle.".to_string())),
    }
  }

  /// Applies one provider notification. Business outcomes, including
  /// rejected or irrelevant notifications, are `Ok`; only failures to reach
  /// the commerce platform are errors.
  #[instrument(name = "Orchestrator::reconcile", skip_all, fields(channel = raw.channel.as_str()))]
  pub async fn reconcile(&self, raw: RawNotification) -> Result<ReconcileOutcome> {
    let ctx = ContextData::new(ReconcileCtxData {
      deps: Arc::clone(&self.deps),
      raw,
      notification: None,
      order_id: None,
      outcome: None,
    });

    self.workflows.run(ctx.clone()).await?;
    let outcome = ctx
      .read()
      .outcome
      .clone()
      .ok_or_else(|| AppError::Internal("Reconciliation finished without an outcome.".to_string()))?;
    info!(outcome = outcome.label(), order_id = ?outcome.order_id(), "Notification reconciled.");
    Ok(outcome)
  }

  #[instrument(name = "Orchestrator::get_order", skip(self))]
  pub async fn get_order(&self, id: OrderId) -> Result<Order> {
    let limit = self.deps.settings.external_timeout;
    bounded("commerce service", limit, self.deps.commerce.get_order(id))
      .await??
      .ok_or_else(|| AppError::NotFound(format!("Order {} does not exist", id)))
  }
}
