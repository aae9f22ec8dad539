//! Per-SKU choice between the trained model and the moving-average fallback.

use grapeiq_core::forecast::ModelUsed;
use serde::{Deserialize, Serialize};

/// Histories shorter than this use the moving average.
pub const MIN_HISTORY_FOR_MODEL: usize = 50;

/// Trailing window of the moving-average fallback.
pub const MOVING_AVERAGE_WINDOW: usize = 28;

/// Fixed policy constants. Configurable, but the defaults are the
/// behaviour downstream consumers rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPolicy {
  pub min_history:           usize,
  pub moving_average_window: usize,
}

impl Default for ForecastPolicy {
  fn default() -> Self {
    Self {
      min_history:           MIN_HISTORY_FOR_MODEL,
      moving_average_window: MOVING_AVERAGE_WINDOW,
    }
  }
}

/// Which estimator a SKU is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  MovingAverage,
  GradientBoost,
}

impl Strategy {
  pub fn model_used(self) -> ModelUsed {
    match self {
      Self::MovingAverage => ModelUsed::SimpleMovingAverage,
      Self::GradientBoost => ModelUsed::LightGbm,
    }
  }
}

impl ForecastPolicy {
  /// Route a SKU by the number of observations in its series.
  pub fn select(&self, history_len: usize) -> Strategy {
    if history_len < self.min_history {
      Strategy::MovingAverage
    } else {
      Strategy::GradientBoost
    }
  }
}
