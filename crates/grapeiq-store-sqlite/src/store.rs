//! [`SqliteStore`], the SQLite implementation of the GrapeIQ storage seams.

use std::path::Path;

use grapeiq_core::{
  forecast::ForecastRecord,
  sales::{ChannelSales, NewSale, SalesRecord},
  store::{ForecastSink, ForecastStore, SalesSource},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawForecast, RawSale, encode_date, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Sales history and forecast results backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SalesSource impl ────────────────────────────────────────────────────────

impl SalesSource for SqliteStore {
  type Error = Error;

  async fn read_sales(&self, tenant_id: Uuid) -> Result<Vec<SalesRecord>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawSale> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tenant_id, date, sku, qty FROM sales
           WHERE tenant_id = ?1
           ORDER BY date, sku",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], |row| {
            Ok(RawSale {
              tenant_id: row.get(0)?,
              date:      row.get(1)?,
              sku:       row.get(2)?,
              qty:       row.get(3)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSale::into_record).collect()
  }
}

// ─── ForecastSink impl ───────────────────────────────────────────────────────

impl ForecastSink for SqliteStore {
  type Error = Error;

  async fn replace_forecasts(&self, tenant_id: Uuid, rows: Vec<ForecastRecord>) -> Result<usize> {
    let tenant_str = encode_uuid(tenant_id);
    let encoded: Vec<(String, String, f64, &'static str)> = rows
      .iter()
      .map(|r| (r.sku.clone(), encode_date(r.date), r.predicted_qty, r.model_used.as_str()))
      .collect();

    let (deleted, inserted) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let deleted = tx.execute(
          "DELETE FROM forecasts WHERE tenant_id = ?1",
          rusqlite::params![tenant_str],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO forecasts (tenant_id, sku, date, predicted_qty, model_used)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          // Any failure here drops `tx` uncommitted, restoring the prior set.
          for (sku, date, qty, model) in &encoded {
            stmt.execute(rusqlite::params![tenant_str, sku, date, qty, model])?;
          }
        }
        tx.commit()?;
        Ok((deleted, encoded.len()))
      })
      .await?;

    debug!(tenant_id = %tenant_id, deleted, inserted, "replaced forecast set");
    Ok(inserted)
  }
}

// ─── ForecastStore impl ──────────────────────────────────────────────────────

impl ForecastStore for SqliteStore {
  async fn upsert_sales(&self, tenant_id: Uuid, rows: Vec<NewSale>) -> Result<usize> {
    for row in &rows {
      row.validate()?;
    }

    let tenant_str = encode_uuid(tenant_id);
    let encoded: Vec<(String, String, i64, f64, String)> = rows
      .into_iter()
      .map(|r| (encode_date(r.date), r.sku, r.qty, r.price, r.channel))
      .collect();

    let n = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO sales (tenant_id, date, sku, qty, price, channel)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (tenant_id, date, sku)
             DO UPDATE SET qty = excluded.qty, price = excluded.price",
          )?;
          for (date, sku, qty, price, channel) in &encoded {
            stmt.execute(rusqlite::params![tenant_str, date, sku, qty, price, channel])?;
          }
        }
        tx.commit()?;
        Ok(encoded.len())
      })
      .await?;

    Ok(n)
  }

  async fn list_forecasts(&self, tenant_id: Uuid) -> Result<Vec<ForecastRecord>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawForecast> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tenant_id, sku, date, predicted_qty, model_used FROM forecasts
           WHERE tenant_id = ?1
           ORDER BY date, sku",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], |row| {
            Ok(RawForecast {
              tenant_id:     row.get(0)?,
              sku:           row.get(1)?,
              date:          row.get(2)?,
              predicted_qty: row.get(3)?,
              model_used:    row.get(4)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawForecast::into_record).collect()
  }

  async fn sales_by_channel(&self, tenant_id: Uuid) -> Result<Vec<ChannelSales>> {
    let tenant_str = encode_uuid(tenant_id);

    let totals = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT channel, SUM(qty), SUM(qty * price) FROM sales
           WHERE tenant_id = ?1
           GROUP BY channel
           ORDER BY channel",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], |row| {
            Ok(ChannelSales {
              channel: row.get(0)?,
              units:   row.get(1)?,
              revenue: row.get(2)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    Ok(totals)
  }
}
