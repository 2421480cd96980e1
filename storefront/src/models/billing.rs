// storefront/src/models/billing.rs

use serde::{Deserialize, Serialize};

/// Billing details captured once at checkout. Address fields are optional
/// because eSIM products ship nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address1: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address2: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub state: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub postcode: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
}

impl Billing {
  /// Names the first required field that is blank, if any.
  pub fn missing_field(&self) -> Option<&'static str> {
    if self.email.trim().is_empty() {
      Some("email")
    } else if self.first_name.trim().is_empty() {
      Some("firstName")
    } else if self.last_name.trim().is_empty() {
      Some("lastName")
    } else {
      None
    }
  }

  /// `local@domain.tld` shape only; deliverability is the platform's concern.
  pub fn email_looks_valid(&self) -> bool {
    let email = self.email.trim();
    match email.split_once('@') {
      Some((local, domain)) => {
        !local.is_empty()
          && !domain.contains('@')
          && !email.contains(char::is_whitespace)
          && domain.split('.').count() >= 2
          && domain.split('.').all(|label| !label.is_empty())
      }
      None => false,
    }
  }

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name.trim(), self.last_name.trim())
  }
}
