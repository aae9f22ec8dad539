//! Forecast output records.
//!
//! A forecast run produces the complete set of rows for a tenant; the store
//! replaces the prior set wholesale. At most one set is active per tenant,
//! keyed by `(tenant_id, sku, date)`.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Which estimator produced a forecast row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelUsed {
  /// Mean of the trailing window; cold-start fallback for short histories.
  SimpleMovingAverage,
  /// Gradient-boosted regression trees over calendar and lag features.
  #[serde(rename = "lightgbm")]
  LightGbm,
}

impl ModelUsed {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::SimpleMovingAverage => "simple_moving_average",
      Self::LightGbm => "lightgbm",
    }
  }
}

impl fmt::Display for ModelUsed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ModelUsed {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "simple_moving_average" => Ok(Self::SimpleMovingAverage),
      "lightgbm" => Ok(Self::LightGbm),
      other => Err(Error::UnknownModel(other.to_owned())),
    }
  }
}

/// One predicted quantity for one SKU on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
  pub tenant_id:     Uuid,
  pub sku:           String,
  pub date:          NaiveDate,
  /// Never negative once produced by the forecasting job.
  pub predicted_qty: f64,
  pub model_used:    ModelUsed,
}

impl ForecastRecord {
  /// Build a record, clamping negative (or NaN) predictions to zero.
  pub fn clamped(
    tenant_id: Uuid,
    sku: impl Into<String>,
    date: NaiveDate,
    predicted_qty: f64,
    model_used: ModelUsed,
  ) -> Self {
    Self {
      tenant_id,
      sku: sku.into(),
      date,
      predicted_qty: clamp_quantity(predicted_qty),
      model_used,
    }
  }
}

/// No negative forecasts: anything below zero becomes zero.
pub fn clamp_quantity(qty: f64) -> f64 { qty.max(0.0) }
