//! Calendar and lag features for a single SKU's quantity series.
//!
//! Lag positions without enough history are filled with zero rather than
//! left undefined.

use chrono::{Datelike, NaiveDate};

/// Lag offsets, in rows, used as predictors.
pub const LAGS: [usize; 3] = [7, 14, 28];

/// Number of predictor columns in [`FeatureRow::features`].
pub const N_FEATURES: usize = 6;

/// Predictor names in the order [`FeatureRow::features`] emits them.
pub const FEATURE_NAMES: [&str; N_FEATURES] =
  ["weekday", "month", "day_of_month", "lag_7", "lag_14", "lag_28"];

/// Derived record for one `(date, sku)` position.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
  pub date:         NaiveDate,
  /// Monday = 0 … Sunday = 6.
  pub weekday:      u32,
  /// 1 … 12.
  pub month:        u32,
  pub day_of_month: u32,
  pub lag_7:        f64,
  pub lag_14:       f64,
  pub lag_28:       f64,
  /// The regression target.
  pub total_qty:    f64,
}

impl FeatureRow {
  /// Predictor vector, ordered as [`FEATURE_NAMES`].
  pub fn features(&self) -> [f64; N_FEATURES] {
    [
      f64::from(self.weekday),
      f64::from(self.month),
      f64::from(self.day_of_month),
      self.lag_7,
      self.lag_14,
      self.lag_28,
    ]
  }

  /// Overwrite all three lag features with the same value.
  pub fn fill_lags(&mut self, value: f64) {
    self.lag_7 = value;
    self.lag_14 = value;
    self.lag_28 = value;
  }
}

/// Feature rows for one SKU, one per history date in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
  rows: Vec<FeatureRow>,
}

impl FeatureTable {
  /// Derive features from `series`, indexed by `dates`. Extra entries on
  /// either side are ignored.
  pub fn build(dates: &[NaiveDate], series: &[f64]) -> Self {
    let lag = |i: usize, k: usize| if i >= k { series[i - k] } else { 0.0 };

    let rows = dates
      .iter()
      .zip(series)
      .enumerate()
      .map(|(i, (&date, &total_qty))| FeatureRow {
        date,
        weekday: date.weekday().num_days_from_monday(),
        month: date.month(),
        day_of_month: date.day(),
        lag_7: lag(i, LAGS[0]),
        lag_14: lag(i, LAGS[1]),
        lag_28: lag(i, LAGS[2]),
        total_qty,
      })
      .collect();

    Self { rows }
  }

  pub fn rows(&self) -> &[FeatureRow] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// The most recent observed quantity.
  pub fn last_total(&self) -> Option<f64> { self.rows.last().map(|r| r.total_qty) }
}
