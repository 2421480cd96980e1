// storefront/src/models/order.rs

use crate::models::billing::Billing;
use crate::payments::PaymentMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier assigned by the commerce platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for OrderId {
  type Err = std::num::ParseIntError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.parse::<u64>().map(OrderId)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  /// Payment accepted, fulfillment pending.
  Processing,
  Completed,
  Failed,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Processing => "processing",
      OrderStatus::Completed => "completed",
      OrderStatus::Failed => "failed",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Failed | OrderStatus::Cancelled)
  }

  /// Decides whether moving from `self` to `next` may be written.
  ///
  /// Only forward moves apply: pending → processing → completed, and any
  /// non-terminal status → failed or cancelled. Terminal statuses accept
  /// nothing, except that [`RetryPolicy::SupersedeFailedAttempt`] lets a new
  /// attempt move a failed order to processing or completed.
  pub fn transition_to(self, next: OrderStatus, policy: RetryPolicy) -> Transition {
    use OrderStatus::*;

    if self == next {
      return Transition::Unchanged;
    }
    match (self, next) {
      (_, Pending) => Transition::Ignored,
      (Pending, _) => Transition::Apply,
      (Processing, Completed | Failed | Cancelled) => Transition::Apply,
      (Failed, Processing | Completed) if policy == RetryPolicy::SupersedeFailedAttempt => Transition::Apply,
      _ => Transition::Ignored,
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "processing" => Ok(OrderStatus::Processing),
      "completed" => Ok(OrderStatus::Completed),
      "failed" => Ok(OrderStatus::Failed),
      "cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Apply,
  /// Already in the requested status.
  Unchanged,
  /// Backward or out of a terminal status.
  Ignored,
}

/// How a notification from a new payment attempt treats a `failed` order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
  #[default]
  Terminal,
  SupersedeFailedAttempt,
}

impl FromStr for RetryPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "terminal" => Ok(RetryPolicy::Terminal),
      "supersede" | "supersede_failed_attempt" => Ok(RetryPolicy::SupersedeFailedAttempt),
      other => Err(format!("unknown payment retry policy '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub product_id: u64,
  pub name: String,
  pub quantity: u32,
  pub total: u64,
}

/// An order as held by the commerce platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: OrderId,
  pub number: String,
  pub status: OrderStatus,
  pub currency: String,
  /// Whole currency units, tax included.
  pub total: u64,
  pub line_items: Vec<OrderLine>,
  pub billing: Billing,
  /// Payment id of the attempt whose notification last changed the status.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_reference: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
  pub product_id: u64,
  pub name: String,
  pub quantity: u32,
  pub unit_price: u64,
}

/// What checkout hands the commerce platform. The order is created `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
  pub line_items: Vec<NewOrderLine>,
  pub billing: Billing,
  pub currency: String,
  pub payment_method: PaymentMethod,
}

impl NewOrder {
  pub fn subtotal(&self) -> u64 {
    self
      .line_items
      .iter()
      .map(|l| l.unit_price.saturating_mul(u64::from(l.quantity)))
      .sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use OrderStatus::*;

  const ALL: [OrderStatus; 5] = [Pending, Processing, Completed, Failed, Cancelled];

  #[test]
  fn forward_moves_apply() {
    let p = RetryPolicy::Terminal;
    assert_eq!(Pending.transition_to(Processing, p), Transition::Apply);
    assert_eq!(Pending.transition_to(Completed, p), Transition::Apply);
    assert_eq!(Processing.transition_to(Completed, p), Transition::Apply);
    assert_eq!(Processing.transition_to(Failed, p), Transition::Apply);
    assert_eq!(Pending.transition_to(Cancelled, p), Transition::Apply);
  }

  #[test]
  fn completed_never_moves() {
    for policy in [RetryPolicy::Terminal, RetryPolicy::SupersedeFailedAttempt] {
      for next in ALL {
        let t = Completed.transition_to(next, policy);
        assert_ne!(t, Transition::Apply, "completed -> {next} under {policy:?}");
      }
    }
  }

  #[test]
  fn nothing_goes_back_to_pending() {
    for from in ALL {
      if from != Pending {
        assert_eq!(from.transition_to(Pending, RetryPolicy::SupersedeFailedAttempt), Transition::Ignored);
      }
    }
  }

  #[test]
  fn failed_is_final_unless_superseded() {
    assert_eq!(Failed.transition_to(Completed, RetryPolicy::Terminal), Transition::Ignored);
    assert_eq!(Failed.transition_to(Processing, RetryPolicy::Terminal), Transition::Ignored);
    assert_eq!(
      Failed.transition_to(Processing, RetryPolicy::SupersedeFailedAttempt),
      Transition::Apply
    );
    assert_eq!(
      Failed.transition_to(Cancelled, RetryPolicy::SupersedeFailedAttempt),
      Transition::Ignored
    );
  }

  #[test]
  fn same_status_is_unchanged() {
    for s in ALL {
      assert_eq!(s.transition_to(s, RetryPolicy::Terminal), Transition::Unchanged);
    }
  }

  #[test]
  fn status_text_round_trips() {
    for s in ALL {
      assert_eq!(s.as_str().parse::<OrderStatus>(), Ok(s));
    }
    assert!("refunded".parse::<OrderStatus>().is_err());
  }
}
