//! Error types for `grapeiq-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown forecast model: {0:?}")]
  UnknownModel(String),

  #[error("negative sales quantity {qty} for sku {sku:?}")]
  NegativeQuantity { sku: String, qty: i64 },

  #[error("empty sku")]
  EmptySku,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
