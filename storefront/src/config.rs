// storefront/src/config.rs

use crate::errors::{AppError, Result};
use crate::models::RetryPolicy;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Public base URL of this service; provider callbacks point here.
  pub app_base_url: String,

  pub commerce_api_url: String,
  pub commerce_host_header: Option<String>,
  pub wc_consumer_key: String,
  pub wc_consumer_secret: String,

  pub store_currency: String,
  pub external_timeout: Duration,
  pub payment_retry_policy: RetryPolicy,

  pub eximbay_mid: String,
  pub eximbay_secret_key: String,
  pub eximbay_api_url: String,

  pub portone_store_id: Option<String>,
  pub portone_channel_key: Option<String>,

  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_vars(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source.
  pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let required =
      |name: &str| get(name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)));

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = get("SERVER_PORT")
      .unwrap_or_else(|| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let app_base_url = get("APP_BASE_URL")
      .unwrap_or_else(|| format!("http://{}:{}", server_host, server_port))
      .trim_end_matches('/')
      .to_string();

    let external_timeout_secs = get("EXTERNAL_TIMEOUT_SECS")
      .unwrap_or_else(|| "20".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid EXTERNAL_TIMEOUT_SECS: {}", e)))?;
    if external_timeout_secs == 0 {
      return Err(AppError::Config("EXTERNAL_TIMEOUT_SECS must be positive".to_string()));
    }

    let payment_retry_policy = match get("PAYMENT_RETRY_POLICY") {
      Some(raw) => raw.parse::<RetryPolicy>().map_err(AppError::Config)?,
      None => RetryPolicy::default(),
    };

    let log_format = match get("LOG_FORMAT").as_deref() {
      None | Some("pretty") | Some("text") => LogFormat::Pretty,
      Some("json") => LogFormat::Json,
      Some(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
    };

    let config = Self {
      commerce_api_url: required("COMMERCE_API_URL")?,
      commerce_host_header: get("COMMERCE_HOST_HEADER"),
      wc_consumer_key: get("WC_CONSUMER_KEY").unwrap_or_default(),
      wc_consumer_secret: get("WC_CONSUMER_SECRET").unwrap_or_default(),
      store_currency: get("STORE_CURRENCY").unwrap_or_else(|| "KRW".to_string()).to_ascii_uppercase(),
      external_timeout: Duration::from_secs(external_timeout_secs),
      payment_retry_policy,
      eximbay_mid: get("EXIMBAY_MID").unwrap_or_default(),
      eximbay_secret_key: required("EXIMBAY_SECRET_KEY")?,
      eximbay_api_url: get("EXIMBAY_API_URL").unwrap_or_else(|| "https://api-test.eximbay.com".to_string()),
      portone_store_id: get("PORTONE_STORE_ID"),
      portone_channel_key: get("PORTONE_CHANNEL_KEY"),
      log_format,
      server_host,
      server_port,
      app_base_url,
    };

    // Secrets stay out of the log.
    tracing::info!(
      commerce_api_url = %config.commerce_api_url,
      store_currency = %config.store_currency,
      timeout_secs = external_timeout_secs,
      retry_policy = ?config.payment_retry_policy,
      portone_enabled = config.portone_store_id.is_some() && config.portone_channel_key.is_some(),
      "Application configuration loaded successfully."
    );
    Ok(config)
  }

  /// Where providers send webhooks and browser returns.
  pub fn payment_callback_url(&self) -> String {
    format!("{}/api/v1/payment/webhook", self.app_base_url)
  }
}
