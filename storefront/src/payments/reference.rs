// storefront/src/payments/reference.rs

//! Payment references correlate one provider transaction with one order.
//!
//! ```text
//! payment-reference = "order_" order-id "_" timestamp-ms
//! order-id          = 1*DIGIT   ; fits u64
//! timestamp-ms      = 1*DIGIT   ; unix epoch milliseconds, fits u64
//! ```

use crate::models::OrderId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PREFIX: &str = "order_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaymentReference {
  pub order_id: OrderId,
  pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
  #[error("payment reference must start with 'order_'")]
  MissingPrefix,

  #[error("payment reference has no timestamp segment")]
  MissingTimestamp,

  #[error("payment reference {part} is empty")]
  Empty { part: &'static str },

  #[error("payment reference {part} must contain only digits")]
  NotDigits { part: &'static str },

  #[error("payment reference {part} is out of range")]
  Overflow { part: &'static str },
}

impl PaymentReference {
  pub fn new(order_id: OrderId, created_at_ms: u64) -> Self {
    Self {
      order_id,
      created_at_ms,
    }
  }

  /// A fresh reference for a new attempt on `order_id`.
  pub fn now(order_id: OrderId) -> Self {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    Self::new(order_id, millis)
  }

  pub fn encode(&self) -> String {
    format!("{}{}_{}", PREFIX, self.order_id.0, self.created_at_ms)
  }
}

impl fmt::Display for PaymentReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.encode())
  }
}

fn digits(part: &'static str, s: &str) -> Result<u64, ReferenceError> {
  if s.is_empty() {
    return Err(ReferenceError::Empty { part });
  }
  // `u64::from_str` would also accept a leading '+'.
  if !s.bytes().all(|b| b.is_ascii_digit()) {
    return Err(ReferenceError::NotDigits { part });
  }
  s.parse::<u64>().map_err(|_| ReferenceError::Overflow { part })
}

impl FromStr for PaymentReference {
  type Err = ReferenceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let rest = s.strip_prefix(PREFIX).ok_or(ReferenceError::MissingPrefix)?;
    let (order_part, ts_part) = rest.split_once('_').ok_or(ReferenceError::MissingTimestamp)?;
    let order_id = digits("order id", order_part)?;
    let created_at_ms = digits("timestamp", ts_part)?;
    Ok(Self::new(OrderId(order_id), created_at_ms))
  }
}
