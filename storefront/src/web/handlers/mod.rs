// storefront/src/web/handlers/mod.rs

use serde::Serialize;

pub mod order_handlers;
pub mod payment_handlers;
pub mod webhook_handlers;

/// `{"success": true, ..body}` envelope shared by the UI-facing endpoints.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
  success: bool,
  #[serde(flatten)]
  body: T,
}

impl<T: Serialize> Success<T> {
  pub fn new(body: T) -> Self {
    Self { success: true, body }
  }
}
