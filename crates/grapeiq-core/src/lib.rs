//! Core types and trait definitions for the GrapeIQ demand-forecasting
//! service.
//!
//! No HTTP or database dependencies live here. The forecasting core, the
//! SQLite backend and the HTTP layer all build on these types.

// Store traits spell out `Send` on their returned futures; implementors may
// still write plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod forecast;
pub mod sales;
pub mod store;

pub use error::{Error, Result};
