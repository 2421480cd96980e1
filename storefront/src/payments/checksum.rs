// storefront/src/payments/checksum.rs

//! Eximbay `fgkey`: hex SHA-256 over the shared secret followed by the
//! transaction reference, currency and amount, concatenated without separators.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub fn eximbay_fgkey(secret: &str, reference: &str, currency: &str, amount: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(secret.as_bytes());
  hasher.update(reference.as_bytes());
  hasher.update(currency.as_bytes());
  hasher.update(amount.as_bytes());
  hex::encode(hasher.finalize())
}

/// Compares in constant time. Hex case in `provided` is ignored.
pub fn verify_eximbay_fgkey(secret: &str, reference: &str, currency: &str, amount: &str, provided: &str) -> bool {
  let expected = eximbay_fgkey(secret, reference, currency, amount);
  let provided = provided.trim().to_ascii_lowercase();
  expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
  use super::*;

  const KNOWN: &str = "6eebe3ee8a84928d825df8a8d359d4ea8fd9b3df4f5bc9dba6b4de882112f7ad";

  #[test]
  fn matches_known_digest() {
    assert_eq!(eximbay_fgkey("test_secret", "1001", "KRW", "55000"), KNOWN);
  }

  #[test]
  fn verification_accepts_upper_case_hex() {
    assert!(verify_eximbay_fgkey(
      "test_secret",
      "1001",
      "KRW",
      "55000",
      &KNOWN.to_ascii_uppercase()
    ));
  }

  #[test]
  fn any_changed_field_fails_verification() {
    assert!(!verify_eximbay_fgkey("other_secret", "1001", "KRW", "55000", KNOWN));
    assert!(!verify_eximbay_fgkey("test_secret", "1002", "KRW", "55000", KNOWN));
    assert!(!verify_eximbay_fgkey("test_secret", "1001", "USD", "55000", KNOWN));
    assert!(!verify_eximbay_fgkey("test_secret", "1001", "KRW", "1", KNOWN));
    assert!(!verify_eximbay_fgkey("test_secret", "1001", "KRW", "55000", &KNOWN[..10]));
    assert!(!verify_eximbay_fgkey("test_secret", "1001", "KRW", "55000", ""));
  }
}
