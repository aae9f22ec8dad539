//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate};
use grapeiq_core::{
  forecast::{ForecastRecord, ModelUsed},
  sales::NewSale,
  store::{ForecastSink, ForecastStore, SalesSource},
};
use grapeiq_forecast::{FixedClock, ForecastJob, ForecastSettings, JobOutcome, JobRequest};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(offset: i64) -> NaiveDate {
  NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

fn sale(sku: &str, offset: i64, qty: i64) -> NewSale {
  NewSale {
    date: day(offset),
    sku: sku.into(),
    qty,
    price: 19.9,
    channel: "cellar_door".into(),
  }
}

fn forecast(tenant_id: Uuid, sku: &str, offset: i64, qty: f64) -> ForecastRecord {
  ForecastRecord {
    tenant_id,
    sku: sku.into(),
    date: day(offset),
    predicted_qty: qty,
    model_used: ModelUsed::SimpleMovingAverage,
  }
}

// ─── Sales ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn read_sales_of_unknown_tenant_is_empty() {
  let s = store().await;
  assert!(s.read_sales(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_then_read_ordered_by_date() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let n = s
    .upsert_sales(tenant, vec![sale("B", 2, 1), sale("A", 0, 4), sale("A", 1, 6)])
    .await
    .unwrap();
  assert_eq!(n, 3);

  let rows = s.read_sales(tenant).await.unwrap();
  let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
  assert_eq!(dates, vec![day(0), day(1), day(2)]);
  assert!(rows.iter().all(|r| r.tenant_id == tenant));
  assert_eq!(rows[0].qty, 4);
}

#[tokio::test]
async fn upsert_replaces_quantity_on_conflict() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  s.upsert_sales(tenant, vec![sale("A", 0, 4)]).await.unwrap();
  s.upsert_sales(tenant, vec![sale("A", 0, 9)]).await.unwrap();

  let rows = s.read_sales(tenant).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].qty, 9);
}

#[tokio::test]
async fn upsert_rejects_negative_quantity_without_writing() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let err = s
    .upsert_sales(tenant, vec![sale("A", 0, 1), sale("A", 1, -2)])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(_)));
  assert!(s.read_sales(tenant).await.unwrap().is_empty());
}

#[tokio::test]
async fn sales_are_scoped_by_tenant() {
  let s = store().await;
  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  s.upsert_sales(a, vec![sale("A", 0, 1)]).await.unwrap();
  s.upsert_sales(b, vec![sale("A", 0, 2), sale("B", 0, 3)]).await.unwrap();

  assert_eq!(s.read_sales(a).await.unwrap().len(), 1);
  assert_eq!(s.read_sales(b).await.unwrap().len(), 2);
}

#[tokio::test]
async fn sales_by_channel_sums_units_and_revenue() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let online = |offset: i64, qty: i64| NewSale {
    price: 10.0,
    channel: "online".into(),
    ..sale("A", offset, qty)
  };
  s.upsert_sales(tenant, vec![online(0, 3), online(1, 2), sale("A", 2, 1)])
    .await
    .unwrap();
  s.upsert_sales(Uuid::new_v4(), vec![online(0, 100)]).await.unwrap();

  let totals = s.sales_by_channel(tenant).await.unwrap();
  assert_eq!(totals.len(), 2);
  assert_eq!(totals[0].channel, "cellar_door");
  assert_eq!(totals[0].units, 1);
  assert!((totals[0].revenue - 19.9).abs() < 1e-9);
  assert_eq!(totals[1].channel, "online");
  assert_eq!(totals[1].units, 5);
  assert!((totals[1].revenue - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn sales_by_channel_of_unknown_tenant_is_empty() {
  let s = store().await;
  assert!(s.sales_by_channel(Uuid::new_v4()).await.unwrap().is_empty());
}

// ─── Forecasts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_then_list_ordered_by_date_then_sku() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let rows = vec![
    forecast(tenant, "B", 1, 2.0),
    forecast(tenant, "A", 1, 1.0),
    forecast(tenant, "B", 0, 3.0),
  ];
  assert_eq!(s.replace_forecasts(tenant, rows).await.unwrap(), 3);

  let listed = s.list_forecasts(tenant).await.unwrap();
  let keys: Vec<(NaiveDate, &str)> = listed.iter().map(|r| (r.date, r.sku.as_str())).collect();
  assert_eq!(keys, vec![(day(0), "B"), (day(1), "A"), (day(1), "B")]);
}

#[tokio::test]
async fn replace_supersedes_prior_set() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  s.replace_forecasts(tenant, vec![forecast(tenant, "OLD", 0, 1.0)])
    .await
    .unwrap();
  s.replace_forecasts(tenant, vec![forecast(tenant, "NEW", 0, 2.0)])
    .await
    .unwrap();

  let listed = s.list_forecasts(tenant).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].sku, "NEW");
}

#[tokio::test]
async fn replace_with_empty_set_clears_tenant() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  s.replace_forecasts(tenant, vec![forecast(tenant, "A", 0, 1.0)])
    .await
    .unwrap();
  assert_eq!(s.replace_forecasts(tenant, vec![]).await.unwrap(), 0);
  assert!(s.list_forecasts(tenant).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_insert_rolls_back_the_whole_replace() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let prior = vec![forecast(tenant, "A", 0, 5.0), forecast(tenant, "A", 1, 5.0)];
  s.replace_forecasts(tenant, prior.clone()).await.unwrap();

  // The negative quantity violates the CHECK constraint after valid rows
  // have already been inserted in the same transaction.
  let poisoned = vec![
    forecast(tenant, "B", 0, 7.0),
    forecast(tenant, "B", 1, 7.0),
    forecast(tenant, "B", 2, -1.0),
  ];
  let err = s.replace_forecasts(tenant, poisoned).await.unwrap_err();
  assert!(matches!(err, Error::Database(_)));

  assert_eq!(s.list_forecasts(tenant).await.unwrap(), prior);
}

#[tokio::test]
async fn replace_leaves_other_tenants_untouched() {
  let s = store().await;
  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  s.replace_forecasts(b, vec![forecast(b, "B", 0, 1.0)]).await.unwrap();
  s.replace_forecasts(a, vec![forecast(a, "A", 0, 1.0)]).await.unwrap();
  s.replace_forecasts(a, vec![]).await.unwrap();

  assert_eq!(s.list_forecasts(b).await.unwrap().len(), 1);
}

// ─── Job against the store ───────────────────────────────────────────────────

#[tokio::test]
async fn job_writes_moving_average_rows_for_short_history() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let sales = (0..10).map(|i| sale("VINO-001", i, 5)).collect();
  s.upsert_sales(tenant, sales).await.unwrap();

  let clock = FixedClock(day(30));
  let outcome = ForecastJob::new(&s, &s, &clock, ForecastSettings::default())
    .run(JobRequest::new(tenant))
    .await;
  assert!(matches!(outcome, JobOutcome::Completed(_)));

  let rows = s.list_forecasts(tenant).await.unwrap();
  assert_eq!(rows.len(), 14);
  assert_eq!(rows[0].date, day(31));
  assert_eq!(rows[13].date, day(44));
  assert!(rows.iter().all(|r| r.predicted_qty == 5.0));
  assert!(rows.iter().all(|r| r.model_used == ModelUsed::SimpleMovingAverage));
}

#[tokio::test]
async fn job_reruns_are_idempotent() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let sales = (0..60).map(|i| sale("VINO-002", i, 10)).collect();
  s.upsert_sales(tenant, sales).await.unwrap();

  let clock = FixedClock(day(60));
  let job = ForecastJob::new(&s, &s, &clock, ForecastSettings::default());
  job.run(JobRequest::new(tenant)).await;
  let first = s.list_forecasts(tenant).await.unwrap();
  job.run(JobRequest::new(tenant)).await;
  let second = s.list_forecasts(tenant).await.unwrap();

  assert_eq!(first.len(), 14);
  assert_eq!(first, second);
  assert!(first.iter().all(|r| r.model_used == ModelUsed::LightGbm));
}

#[tokio::test]
async fn job_without_history_keeps_existing_forecasts() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  s.replace_forecasts(tenant, vec![forecast(tenant, "A", 0, 1.0)])
    .await
    .unwrap();

  let clock = FixedClock(day(0));
  let outcome = ForecastJob::new(&s, &s, &clock, ForecastSettings::default())
    .run(JobRequest::new(tenant))
    .await;
  assert!(matches!(outcome, JobOutcome::NoHistory));
  assert_eq!(s.list_forecasts(tenant).await.unwrap().len(), 1);
}
