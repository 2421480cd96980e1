// storefront/src/payments/mod.rs

//! Payment providers: initiation handles, notification parsing and the
//! payment reference codec that ties a provider transaction to an order.

pub mod checksum;
pub mod eximbay;
pub mod gateway;
pub mod notification;
pub mod portone;
pub mod reference;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use gateway::{Customer, PaymentError, PaymentGateway, PaymentHandle, PaymentRequest};
pub use notification::{classify, ClassifyError, NotificationChannel, ProviderNotification, RawNotification};
pub use reference::{PaymentReference, ReferenceError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  #[default]
  Eximbay,
  PortOne,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Eximbay => "eximbay",
      PaymentMethod::PortOne => "portone",
    }
  }

  /// Label stored on the order for staff.
  pub fn title(&self) -> &'static str {
    match self {
      PaymentMethod::Eximbay => "International Credit Card (Eximbay)",
      PaymentMethod::PortOne => "Credit Card (PortOne)",
    }
  }
}

impl fmt::Display for PaymentMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
