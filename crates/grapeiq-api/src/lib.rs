//! HTTP layer for GrapeIQ forecasting.
//!
//! Exposes an axum [`Router`] backed by any [`ForecastStore`]: sales
//! ingestion and per-channel totals, the forecast trigger and the forecast
//! results query. The
//! `grapeiq-server` binary wires it to a SQLite store.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod runner;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use grapeiq_core::store::ForecastStore;
use grapeiq_forecast::ForecastSettings;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use runner::{JobRunner, TenantLocks};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GRAPEIQ_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  pub store_path:           PathBuf,
  /// Argon2 PHC string of the shared forecast secret.
  pub forecast_secret_hash: String,
  #[serde(default)]
  pub forecast:             ForecastSettings,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub runner: JobRunner<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    let runner = JobRunner::new(store.clone(), config.forecast);
    Self { store, runner, config: Arc::new(config) }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      runner: self.runner.clone(),
      config: self.config.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the GrapeIQ API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ForecastStore + 'static,
{
  Router::new()
    .route("/", get(handlers::root))
    .route("/api/ingest/sales", post(handlers::sales::ingest::<S>))
    .route("/api/forecast/run", post(handlers::forecast::run::<S>))
    .route("/api/forecast/results/{tenant_id}", get(handlers::forecast::results::<S>))
    .route("/api/data/sales_by_channel/{tenant_id}", get(handlers::sales::by_channel::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
