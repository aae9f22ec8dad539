//! SQL schema for the GrapeIQ SQLite store.
//!
//! Executed once at connection startup. The version is recorded in
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Owned by ingestion; the forecasting job only reads it.
CREATE TABLE IF NOT EXISTS sales (
    tenant_id TEXT    NOT NULL,
    date      TEXT    NOT NULL,   -- ISO 8601 calendar date
    sku       TEXT    NOT NULL,
    qty       INTEGER NOT NULL CHECK (qty >= 0),
    price     REAL    NOT NULL DEFAULT 0,
    channel   TEXT    NOT NULL DEFAULT '',
    UNIQUE (tenant_id, date, sku)
);

-- At most one active forecast set per tenant. Replaced wholesale per run.
CREATE TABLE IF NOT EXISTS forecasts (
    tenant_id     TEXT NOT NULL,
    sku           TEXT NOT NULL,
    date          TEXT NOT NULL,
    predicted_qty REAL NOT NULL CHECK (predicted_qty >= 0),
    model_used    TEXT NOT NULL
                  CHECK (model_used IN ('simple_moving_average', 'lightgbm')),
    PRIMARY KEY (tenant_id, sku, date)
);

CREATE INDEX IF NOT EXISTS sales_tenant_date_idx ON sales(tenant_id, date);

PRAGMA user_version = 1;
";
