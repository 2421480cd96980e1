// storefront/src/models/reconcile.rs

use crate::models::order::{OrderId, OrderStatus};
use std::fmt;

/// Why a notification was dropped without touching any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
  UnknownProvider,
  Malformed,
  InvalidChecksum,
  MissingOrderId,
  OrderNotFound,
  /// Amount or currency differ from the order's.
  AmountMismatch,
}

impl DiscardReason {
  pub fn code(&self) -> &'static str {
    match self {
      DiscardReason::UnknownProvider => "UNKNOWN_PROVIDER",
      DiscardReason::Malformed => "MALFORMED",
      DiscardReason::InvalidChecksum => "INVALID_CHECKSUM",
      DiscardReason::MissingOrderId => "MISSING_ORDER_ID",
      DiscardReason::OrderNotFound => "ORDER_NOT_FOUND",
      DiscardReason::AmountMismatch => "AMOUNT_MISMATCH",
    }
  }
}

impl fmt::Display for DiscardReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
  Applied {
    order_id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
  },
  /// Nothing to write: same status, a backward move, or a terminal order.
  Unchanged { order_id: OrderId, status: OrderStatus },
  Discarded(DiscardReason),
}

impl ReconcileOutcome {
  pub fn label(&self) -> &'static str {
    match self {
      ReconcileOutcome::Applied { .. } => "applied",
      ReconcileOutcome::Unchanged { .. } => "unchanged",
      ReconcileOutcome::Discarded(_) => "discarded",
    }
  }

  pub fn order_id(&self) -> Option<OrderId> {
    match self {
      ReconcileOutcome::Applied { order_id, .. } | ReconcileOutcome::Unchanged { order_id, .. } => Some(*order_id),
      ReconcileOutcome::Discarded(_) => None,
    }
  }

  /// Order status after reconciliation, when an order was involved.
  pub fn current_status(&self) -> Option<OrderStatus> {
    match self {
      ReconcileOutcome::Applied { to, .. } => Some(*to),
      ReconcileOutcome::Unchanged { status, .. } => Some(*status),
      ReconcileOutcome::Discarded(_) => None,
    }
  }
}
