//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as ISO 8601 `YYYY-MM-DD` strings, so lexical order is
//! chronological. UUIDs are stored as hyphenated lowercase strings.

use chrono::NaiveDate;
use grapeiq_core::{
  forecast::{ForecastRecord, ModelUsed},
  sales::SalesRecord,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── ModelUsed ───────────────────────────────────────────────────────────────

pub fn decode_model(s: &str) -> Result<ModelUsed> { Ok(s.parse()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `sales` row.
pub struct RawSale {
  pub tenant_id: String,
  pub date:      String,
  pub sku:       String,
  pub qty:       i64,
}

impl RawSale {
  pub fn into_record(self) -> Result<SalesRecord> {
    Ok(SalesRecord {
      tenant_id: decode_uuid(&self.tenant_id)?,
      sku:       self.sku,
      date:      decode_date(&self.date)?,
      qty:       self.qty,
    })
  }
}

/// Raw values read directly from a `forecasts` row.
pub struct RawForecast {
  pub tenant_id:     String,
  pub sku:           String,
  pub date:          String,
  pub predicted_qty: f64,
  pub model_used:    String,
}

impl RawForecast {
  pub fn into_record(self) -> Result<ForecastRecord> {
    Ok(ForecastRecord {
      tenant_id:     decode_uuid(&self.tenant_id)?,
      sku:           self.sku,
      date:          decode_date(&self.date)?,
      predicted_qty: self.predicted_qty,
      model_used:    decode_model(&self.model_used)?,
    })
  }
}
