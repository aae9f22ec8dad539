//! Shared-secret verification for the forecast endpoints.
//!
//! The configured value is an argon2 PHC string; the plaintext secret is
//! never stored.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use rand_core::OsRng;

use crate::error::ApiError;

/// Check `secret` against the PHC string `hash`.
pub fn verify_secret(secret: &str, hash: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(hash).map_err(|_| ApiError::Forbidden)?;
  Argon2::default()
    .verify_password(secret.as_bytes(), &parsed)
    .map_err(|_| ApiError::Forbidden)
}

/// Hash `secret` with a fresh salt, producing a PHC string for config.
pub fn hash_secret(secret: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(secret.as_bytes(), &salt)?.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn correct_secret() {
    let hash = hash_secret("super-secret").unwrap();
    assert!(verify_secret("super-secret", &hash).is_ok());
  }

  #[test]
  fn wrong_secret() {
    let hash = hash_secret("super-secret").unwrap();
    assert!(matches!(verify_secret("guess", &hash), Err(ApiError::Forbidden)));
  }

  #[test]
  fn malformed_hash_denies() {
    assert!(matches!(
      verify_secret("super-secret", "not-a-phc-string"),
      Err(ApiError::Forbidden)
    ));
  }
}
