//! Per-tenant demand forecasting for GrapeIQ.
//!
//! Turns a tenant's daily sales history into per-SKU quantity predictions
//! for a future horizon. Each SKU is forecast either by a gradient-boosted
//! tree model (enough history) or by a trailing moving average (cold start),
//! and the full result set replaces the tenant's previous forecasts in one
//! atomic write.
//!
//! ```text
//! SalesSource ─► SalesTable ─► per SKU ─► ForecastPolicy::select
//!                                  ├─ MovingAverage ─────────────────┐
//!                                  └─ FeatureTable ─► GradientBoost ─┤
//!                                                      ForecastSink ◄┘
//! ```
//!
//! The storage seams live in [`grapeiq_core::store`]; [`ForecastJob`] is the
//! orchestrator that ties them together.

pub mod clock;
pub mod error;
pub mod features;
pub mod gbm;
pub mod job;
pub mod moving_average;
pub mod strategy;
pub mod table;
mod tree;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{JobError, ModelError};
pub use job::{
  DEFAULT_HORIZON, ForecastJob, ForecastSettings, JobOutcome, JobReport, JobRequest,
};
pub use strategy::{ForecastPolicy, Strategy};
