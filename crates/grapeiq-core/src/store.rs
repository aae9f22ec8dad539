//! Storage seams consumed by the forecasting job and the HTTP layer.
//!
//! The traits are implemented by storage backends (e.g.
//! `grapeiq-store-sqlite`). The forecasting core depends only on
//! [`SalesSource`] and [`ForecastSink`]; the HTTP layer additionally needs
//! the ingestion and query operations bundled in [`ForecastStore`].

use std::future::Future;

use uuid::Uuid;

use crate::{
  forecast::ForecastRecord,
  sales::{ChannelSales, NewSale, SalesRecord},
};

// ─── Job seams ───────────────────────────────────────────────────────────────

/// Read side of the forecasting job.
pub trait SalesSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All sales rows for `tenant_id`, ordered by date. A tenant with no
  /// history yields an empty vector, not an error.
  fn read_sales(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SalesRecord>, Self::Error>> + Send + '_;
}

/// Write side of the forecasting job.
pub trait ForecastSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Atomically replace every forecast row of `tenant_id` with `rows`.
  ///
  /// Clear-all and bulk-append happen in one transaction: if any insert
  /// fails the prior set stays authoritative and no new row is visible.
  /// Returns the number of rows written.
  fn replace_forecasts(
    &self,
    tenant_id: Uuid,
    rows: Vec<ForecastRecord>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}

// ─── Full store ──────────────────────────────────────────────────────────────

/// A backend serving both the job and the ingestion/query endpoints.
///
/// Errors share the [`SalesSource`] error type.
pub trait ForecastStore: SalesSource + ForecastSink {
  /// Upsert sales rows keyed by `(tenant_id, date, sku)`; on conflict the
  /// quantity and price are replaced. All rows land in one transaction.
  fn upsert_sales(
    &self,
    tenant_id: Uuid,
    rows: Vec<NewSale>,
  ) -> impl Future<Output = Result<usize, <Self as SalesSource>::Error>> + Send + '_;

  /// The tenant's active forecast set ordered by `(date, sku)`.
  fn list_forecasts(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ForecastRecord>, <Self as SalesSource>::Error>>
  + Send
  + '_;

  /// Sales totals per channel for `tenant_id`, ordered by channel name.
  fn sales_by_channel(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ChannelSales>, <Self as SalesSource>::Error>>
  + Send
  + '_;
}
