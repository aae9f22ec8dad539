//! Error types for the forecasting core.

use thiserror::Error;

/// A failure inside one of the per-SKU estimators.
#[derive(Debug, Error)]
pub enum ModelError {
  #[error("{rows} rows of history leave no training rows for a {horizon}-day horizon")]
  InsufficientHistory { rows: usize, horizon: usize },

  #[error("training set is empty")]
  EmptyTrainingSet,

  #[error("feature matrix has {features} rows but target has {targets}")]
  ShapeMismatch { features: usize, targets: usize },

  #[error("non-finite value in training data")]
  NonFiniteInput,

  #[error("estimator produced a non-finite prediction")]
  NonFiniteOutput,
}

impl ModelError {
  /// Degenerate training data is recoverable: the job falls back to the
  /// moving average for that SKU instead of aborting the tenant.
  pub fn is_degenerate(&self) -> bool {
    matches!(self, Self::InsufficientHistory { .. } | Self::EmptyTrainingSet)
  }
}

/// A terminal failure of one forecast job invocation.
#[derive(Debug, Error)]
pub enum JobError {
  #[error("forecast horizon must be at least one day, got {0}")]
  InvalidHorizon(usize),

  #[error("failed to read sales history: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("forecast failed for sku {sku:?}: {source}")]
  Computation {
    sku:    String,
    #[source]
    source: ModelError,
  },

  #[error("failed to write forecasts: {0}")]
  Write(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("forecast worker failed: {0}")]
  Worker(#[from] tokio::task::JoinError),
}

impl JobError {
  /// The job stage that failed, for log context.
  pub fn stage(&self) -> &'static str {
    match self {
      Self::InvalidHorizon(_) => "validate",
      Self::Source(_) => "read_sales",
      Self::Computation { .. } | Self::Worker(_) => "compute",
      Self::Write(_) => "write_results",
    }
  }
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
