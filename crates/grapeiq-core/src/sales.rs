//! Sales history: the raw input of the forecasting job.
//!
//! Sales rows are owned by the storage backend and never mutated by the
//! forecasting core. Ingestion upserts them keyed by `(tenant_id, date, sku)`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// One day of sales for one SKU, as projected for forecasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
  pub tenant_id: Uuid,
  pub sku:       String,
  pub date:      NaiveDate,
  pub qty:       i64,
}

/// A sales row submitted for ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSale {
  pub date:    NaiveDate,
  pub sku:     String,
  pub qty:     i64,
  pub price:   f64,
  pub channel: String,
}

impl NewSale {
  /// Reject rows the forecasting job could not interpret.
  pub fn validate(&self) -> Result<()> {
    if self.sku.trim().is_empty() {
      return Err(Error::EmptySku);
    }
    if self.qty < 0 {
      return Err(Error::NegativeQuantity {
        sku: self.sku.clone(),
        qty: self.qty,
      });
    }
    Ok(())
  }
}

/// A batch of sales rows for a single tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesBatch {
  pub tenant_id: Uuid,
  pub data:      Vec<NewSale>,
}

/// Units and revenue (`qty * price`) of a tenant's sales through one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSales {
  pub channel: String,
  pub units:   i64,
  pub revenue: f64,
}
