//! Handlers for sales data.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/ingest/sales` | Body: [`SalesBatch`]; upserts rows, returns 201 |
//! | `GET`  | `/api/data/sales_by_channel/{tenant_id}` | `?secret`; units and revenue per channel |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
};
use grapeiq_core::{sales::SalesBatch, store::ForecastStore};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use super::SecretParams;
use crate::{AppState, auth::verify_secret, error::ApiError};

// ─── Ingest ──────────────────────────────────────────────────────────────────

/// `POST /api/ingest/sales`
pub async fn ingest<S>(
  State(state): State<AppState<S>>,
  payload: Result<Json<SalesBatch>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  S: ForecastStore + 'static,
{
  let Json(batch) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  for row in &batch.data {
    row.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
  }

  let tenant_id = batch.tenant_id;
  let ingested = state
    .store
    .upsert_sales(tenant_id, batch.data)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  info!(tenant_id = %tenant_id, ingested, "ingested sales rows");
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message":  "Sales data ingested successfully.",
      "ingested": ingested,
    })),
  ))
}

// ─── By channel ──────────────────────────────────────────────────────────────

/// `GET /api/data/sales_by_channel/{tenant_id}?secret=<secret>`
pub async fn by_channel<S>(
  State(state): State<AppState<S>>,
  Path(tenant_id): Path<Uuid>,
  Query(params): Query<SecretParams>,
) -> Result<Json<Value>, ApiError>
where
  S: ForecastStore + 'static,
{
  verify_secret(&params.secret, &state.config.forecast_secret_hash)?;

  let totals = state
    .store
    .sales_by_channel(tenant_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(json!({
    "tenant_id":        tenant_id,
    "sales_by_channel": totals,
  })))
}
