//! The per-tenant forecast job.
//!
//! One invocation walks a fixed sequence of stages:
//!
//! ```text
//! validate ─► read_sales ─► (no history: end) ─► compute per SKU ─► write_results
//! ```
//!
//! Every failure is caught here, logged with the tenant and stage, and turned
//! into [`JobOutcome::Failed`]. Nothing is written unless every SKU
//! succeeded, and the write itself replaces the tenant's forecasts
//! atomically. The job does not retry.
//!
//! Two concurrent runs for the same tenant would race on the replace; callers
//! must serialise runs per tenant.

use chrono::{Duration, NaiveDate};
use grapeiq_core::{
  forecast::{ForecastRecord, ModelUsed},
  store::{ForecastSink, SalesSource},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  clock::Clock,
  error::{JobError, ModelError},
  features::FeatureTable,
  gbm::{GbmParams, GradientBoostForecaster},
  moving_average,
  strategy::{ForecastPolicy, Strategy},
  table::SalesTable,
};

/// Forecast horizon, in days, when the trigger does not specify one.
pub const DEFAULT_HORIZON: usize = 14;

// ─── Inputs and outputs ──────────────────────────────────────────────────────

/// Tunables of a forecast run. Defaults reproduce the reference behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
  pub policy: ForecastPolicy,
  pub gbm:    GbmParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRequest {
  pub tenant_id: Uuid,
  /// Number of future days to forecast.
  pub horizon:   usize,
}

impl JobRequest {
  pub fn new(tenant_id: Uuid) -> Self { Self { tenant_id, horizon: DEFAULT_HORIZON } }

  pub fn with_horizon(mut self, horizon: usize) -> Self {
    self.horizon = horizon;
    self
  }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
  pub skus_processed:      usize,
  pub moving_average_skus: usize,
  pub model_skus:          usize,
  pub rows_written:        usize,
}

/// Terminal state of one invocation.
#[derive(Debug)]
pub enum JobOutcome {
  /// The tenant has no sales; nothing was written.
  NoHistory,
  Completed(JobReport),
  /// Nothing was written; the prior forecast set is still authoritative.
  Failed(JobError),
}

impl JobOutcome {
  pub fn is_failed(&self) -> bool { matches!(self, Self::Failed(_)) }
}

/// Forecast rows for every SKU of a tenant, ready to persist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastBatch {
  pub rows:                Vec<ForecastRecord>,
  pub skus_processed:      usize,
  pub moving_average_skus: usize,
  pub model_skus:          usize,
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Runs forecast jobs against a sales source and a forecast sink.
///
/// The job borrows its collaborators for the duration of one run; the
/// hosting layer owns the underlying connection.
pub struct ForecastJob<'a, R, W, C> {
  reader:   &'a R,
  writer:   &'a W,
  clock:    &'a C,
  settings: ForecastSettings,
}

impl<'a, R, W, C> ForecastJob<'a, R, W, C>
where
  R: SalesSource,
  W: ForecastSink,
  C: Clock,
{
  pub fn new(reader: &'a R, writer: &'a W, clock: &'a C, settings: ForecastSettings) -> Self {
    Self { reader, writer, clock, settings }
  }

  /// Run one forecast for `request.tenant_id`. Never panics on bad data and
  /// never returns partial success.
  pub async fn run(&self, request: JobRequest) -> JobOutcome {
    let tenant_id = request.tenant_id;
    info!(tenant_id = %tenant_id, horizon = request.horizon, "starting forecast job");

    match self.execute(request).await {
      Ok(Some(report)) => {
        info!(
          tenant_id = %tenant_id,
          skus_processed = report.skus_processed,
          moving_average_skus = report.moving_average_skus,
          model_skus = report.model_skus,
          rows_written = report.rows_written,
          "forecast job completed"
        );
        JobOutcome::Completed(report)
      }
      Ok(None) => {
        warn!(tenant_id = %tenant_id, "no sales history; forecast job finished without writing");
        JobOutcome::NoHistory
      }
      Err(e) => {
        error!(
          tenant_id = %tenant_id,
          stage = e.stage(),
          error = %e,
          "forecast job failed"
        );
        JobOutcome::Failed(e)
      }
    }
  }

  async fn execute(&self, request: JobRequest) -> Result<Option<JobReport>, JobError> {
    let JobRequest { tenant_id, horizon } = request;
    if horizon == 0 {
      return Err(JobError::InvalidHorizon(horizon));
    }

    let records = self
      .reader
      .read_sales(tenant_id)
      .await
      .map_err(|e| JobError::Source(Box::new(e)))?;

    let table = SalesTable::from_records(&records);
    drop(records);
    if table.is_empty() {
      return Ok(None);
    }

    let today = self.clock.today();
    let settings = self.settings;
    let batch = tokio::task::spawn_blocking(move || {
      compute_forecasts(tenant_id, &table, horizon, &settings, today)
    })
    .await??;

    let rows_written = self
      .writer
      .replace_forecasts(tenant_id, batch.rows)
      .await
      .map_err(|e| JobError::Write(Box::new(e)))?;

    Ok(Some(JobReport {
      skus_processed: batch.skus_processed,
      moving_average_skus: batch.moving_average_skus,
      model_skus: batch.model_skus,
      rows_written,
    }))
  }
}

// ─── Computation ─────────────────────────────────────────────────────────────

/// Forecast every SKU column of `table`. The first SKU that fails aborts the
/// whole batch.
pub fn compute_forecasts(
  tenant_id: Uuid,
  table: &SalesTable,
  horizon: usize,
  settings: &ForecastSettings,
  today: NaiveDate,
) -> Result<ForecastBatch, JobError> {
  let mut batch = ForecastBatch::default();

  for column in table.columns() {
    debug!(tenant_id = %tenant_id, sku = %column.sku, "processing sku");

    let (model, predictions) = forecast_sku(
      tenant_id,
      &column.sku,
      table.dates(),
      &column.values,
      horizon,
      settings,
      today,
    )
    .map_err(|source| JobError::Computation { sku: column.sku.clone(), source })?;

    match model {
      ModelUsed::SimpleMovingAverage => batch.moving_average_skus += 1,
      ModelUsed::LightGbm => batch.model_skus += 1,
    }
    batch.skus_processed += 1;
    batch.rows.extend(
      predictions
        .into_iter()
        .map(|(date, qty)| ForecastRecord::clamped(tenant_id, &column.sku, date, qty, model)),
    );
  }

  Ok(batch)
}

/// Forecast a single SKU, choosing the estimator by history length.
fn forecast_sku(
  tenant_id: Uuid,
  sku: &str,
  dates: &[NaiveDate],
  series: &[f64],
  horizon: usize,
  settings: &ForecastSettings,
  today: NaiveDate,
) -> Result<(ModelUsed, Vec<(NaiveDate, f64)>), ModelError> {
  let window = settings.policy.moving_average_window;

  match settings.policy.select(series.len()) {
    Strategy::MovingAverage => {
      warn!(
        tenant_id = %tenant_id,
        sku,
        history = series.len(),
        "short history; using moving average"
      );
      moving_average_path(series, window, horizon, today)
    }
    Strategy::GradientBoost => {
      let features = FeatureTable::build(dates, series);
      match GradientBoostForecaster::new(settings.gbm).fit_predict(&features, horizon) {
        Ok(predictions) => Ok((Strategy::GradientBoost.model_used(), predictions)),
        Err(e) if e.is_degenerate() => {
          warn!(
            tenant_id = %tenant_id,
            sku,
            error = %e,
            "degenerate training data; using moving average"
          );
          moving_average_path(series, window, horizon, today)
        }
        Err(e) => Err(e),
      }
    }
  }
}

fn moving_average_path(
  series: &[f64],
  window: usize,
  horizon: usize,
  today: NaiveDate,
) -> Result<(ModelUsed, Vec<(NaiveDate, f64)>), ModelError> {
  let predictions = moving_average::forecast(series, window, horizon);
  if predictions.iter().any(|p| !p.is_finite()) {
    return Err(ModelError::NonFiniteOutput);
  }

  let dated = (1..=horizon)
    .map(|i| today + Duration::days(i as i64))
    .zip(predictions)
    .collect();
  Ok((Strategy::MovingAverage.model_used(), dated))
}
