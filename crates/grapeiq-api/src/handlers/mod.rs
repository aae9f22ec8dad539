//! Route handlers, one module per resource.

pub mod forecast;
pub mod sales;

use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};

/// Query string of the secret-protected read endpoints.
#[derive(Debug, Deserialize)]
pub struct SecretParams {
  pub secret: String,
}

/// `GET /`
pub async fn root() -> Json<Value> { Json(json!({ "message": "Welcome to GrapeIQ API" })) }
