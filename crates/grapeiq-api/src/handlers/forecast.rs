//! Handlers for `/api/forecast` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/forecast/run` | `?tenant_id&secret[&horizon]`; 202, runs in background |
//! | `GET`  | `/api/forecast/results/{tenant_id}` | `?secret`; rows ordered by date, SKU |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use grapeiq_core::{forecast::ForecastRecord, store::ForecastStore};
use grapeiq_forecast::{DEFAULT_HORIZON, JobRequest};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use super::SecretParams;
use crate::{AppState, auth::verify_secret, error::ApiError};

// ─── Trigger ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RunParams {
  pub tenant_id: Uuid,
  pub secret:    String,
  /// Days to forecast. Defaults to [`DEFAULT_HORIZON`].
  #[serde(default = "default_horizon")]
  pub horizon:   usize,
}

fn default_horizon() -> usize { DEFAULT_HORIZON }

/// `POST /api/forecast/run?tenant_id=<id>&secret=<secret>[&horizon=<days>]`
pub async fn run<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<RunParams>,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  S: ForecastStore + 'static,
{
  verify_secret(&params.secret, &state.config.forecast_secret_hash)?;
  if params.horizon == 0 {
    return Err(ApiError::BadRequest("horizon must be at least one day".into()));
  }

  let request = JobRequest::new(params.tenant_id).with_horizon(params.horizon);
  state
    .runner
    .spawn(request)
    .map_err(|e| ApiError::Conflict(e.to_string()))?;

  info!(tenant_id = %params.tenant_id, horizon = params.horizon, "forecast job accepted");
  Ok((
    StatusCode::ACCEPTED,
    Json(json!({
      "message":   "Forecast job started in the background.",
      "tenant_id": params.tenant_id,
      "horizon":   params.horizon,
    })),
  ))
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// `GET /api/forecast/results/{tenant_id}?secret=<secret>`
///
/// Rows are returned as stored: `tenant_id`, `sku`, `date`, `predicted_qty`
/// and `model_used`.
pub async fn results<S>(
  State(state): State<AppState<S>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<SecretParams>,
) -> Result<Json<Vec<ForecastRecord>>, ApiError>
where
  S: ForecastStore + 'static,
{
  verify_secret(&params.secret, &state.config.forecast_secret_hash)?;

  let rows = state
    .store
    .list_forecasts(tenant_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  if rows.is_empty() {
    return Err(ApiError::NotFound(format!("no forecasts for tenant {tenant_id}")));
  }
  Ok(Json(rows))
}
