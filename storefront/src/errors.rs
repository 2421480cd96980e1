// storefront/src/errors.rs

use crate::payments::PaymentError;
use crate::services::CommerceError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use flow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Order creation failed: {0}")]
  OrderCreation(#[source] CommerceError),

  #[error("Payment initiation failed: {0}")]
  Payment(#[from] PaymentError),

  #[error("Timed out waiting for the {0}")]
  Timeout(&'static str),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Commerce service error: {0}")]
  Commerce(#[from] CommerceError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Stable code returned to clients in the `error` field.
  pub fn code(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "INVALID_INPUT",
      AppError::OrderCreation(_) => "ORDER_CREATION_FAILED",
      AppError::Payment(_) => "PAYMENT_FAILED",
      AppError::Timeout(_) | AppError::Commerce(CommerceError::Timeout) => "TIMEOUT",
      AppError::NotFound(_) => "NOT_FOUND",
      AppError::Commerce(_) => "SERVICE_UNAVAILABLE",
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => "INTERNAL",
    }
  }

  /// Maps a failed order-creation call, keeping timeouts distinct.
  pub fn order_creation(err: CommerceError) -> Self {
    match err {
      CommerceError::Timeout => AppError::Timeout("commerce service"),
      other => AppError::OrderCreation(other),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::OrderCreation(_) => StatusCode::BAD_GATEWAY,
      AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      AppError::Timeout(_) | AppError::Commerce(CommerceError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Commerce(_) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, code = self.code(), "Responding with error");
    } else {
      tracing::warn!(application_error = %self, code = self.code(), "Responding with error");
    }
    HttpResponse::build(status).json(json!({
      "success": false,
      "error": self.code(),
      "message": self.to_string(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
