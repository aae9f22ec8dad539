//! Cold-start fallback: the mean of the trailing window, repeated.
//!
//! No trend, no seasonality. It only exists for SKUs with sparse history.

/// Mean of the last `window` observations, or of the whole series when it
/// is shorter than the window (or `window` is zero). An empty series gives 0.
pub fn trailing_mean(series: &[f64], window: usize) -> f64 {
  if series.is_empty() {
    return 0.0;
  }
  let tail = if window == 0 || series.len() <= window {
    series
  } else {
    &series[series.len() - window..]
  };
  tail.iter().sum::<f64>() / tail.len() as f64
}

/// `horizon` identical predictions equal to [`trailing_mean`].
pub fn forecast(series: &[f64], window: usize, horizon: usize) -> Vec<f64> {
  vec![trailing_mean(series, window); horizon]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_series_is_zero() {
    assert_eq!(trailing_mean(&[], 28), 0.0);
    assert_eq!(forecast(&[], 28, 3), vec![0.0; 3]);
  }

  #[test]
  fn shorter_than_window_uses_whole_series() {
    assert_eq!(trailing_mean(&[2.0, 4.0, 9.0], 28), 5.0);
  }

  #[test]
  fn only_the_trailing_window_counts() {
    let mut series = vec![100.0; 10];
    series.extend([1.0, 2.0, 3.0]);
    assert_eq!(trailing_mean(&series, 3), 2.0);
  }

  #[test]
  fn exact_window_length() {
    let series: Vec<f64> = (1..=28).map(|i| i as f64).collect();
    assert_eq!(trailing_mean(&series, 28), 14.5);
  }

  #[test]
  fn forecast_repeats_the_mean() {
    let preds = forecast(&[5.0; 10], 28, 14);
    assert_eq!(preds.len(), 14);
    assert!(preds.iter().all(|&p| p == 5.0));
  }

  #[test]
  fn zero_horizon_is_empty() {
    assert!(forecast(&[1.0], 28, 0).is_empty());
  }
}
