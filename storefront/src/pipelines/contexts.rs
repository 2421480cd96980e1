// storefront/src/pipelines/contexts.rs

//! Context data for the orchestration pipelines. Handlers receive these
//! wrapped in `flow::ContextData`.

use crate::cart::CartSnapshot;
use crate::models::{Billing, NewOrder, Order, OrderId, ReconcileOutcome};
use crate::orchestrator::Collaborators;
use crate::payments::{Customer, PaymentHandle, PaymentMethod, PaymentReference, ProviderNotification, RawNotification};
use std::sync::Arc;

/// Checkout: cart snapshot and billing in, created order out.
#[derive(Clone)]
pub struct CheckoutCtxData {
  pub deps: Arc<Collaborators>,
  pub cart: CartSnapshot,
  pub billing: Billing,
  pub payment_method: PaymentMethod,
  pub order_request: Option<NewOrder>,
  pub created_order: Option<Order>,
}

/// Payment initiation for an existing order.
#[derive(Clone)]
pub struct PaymentCtxData {
  pub deps: Arc<Collaborators>,
  pub order_id: OrderId,
  pub amount: u64,
  pub currency: String,
  pub customer: Customer,
  pub method: PaymentMethod,
  /// Pre-set by the caller, or assigned by the pipeline.
  pub reference: Option<PaymentReference>,
  pub handle: Option<PaymentHandle>,
}

/// One inbound notification on its way to an order.
#[derive(Clone)]
pub struct ReconcileCtxData {
  pub deps: Arc<Collaborators>,
  pub raw: RawNotification,
  pub notification: Option<ProviderNotification>,
  pub order_id: Option<OrderId>,
  pub outcome: Option<ReconcileOutcome>,
}
