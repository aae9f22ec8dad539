//! The dense date × SKU quantity table built from a tenant's sales rows.
//!
//! Rows are the distinct sales dates in ascending order; columns are the
//! distinct SKUs in ascending order. A SKU with no sale on a date gets zero.
//! Several rows for the same `(date, sku)` cell are averaged, which is what a
//! pivot with mean aggregation produces.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use grapeiq_core::sales::SalesRecord;

/// One SKU column of a [`SalesTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkuSeries {
  pub sku:    String,
  /// One value per table date, aligned with [`SalesTable::dates`].
  pub values: Vec<f64>,
}

/// Date-indexed, SKU-columned quantity table. Built per job and discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
  dates:   Vec<NaiveDate>,
  columns: Vec<SkuSeries>,
}

impl SalesTable {
  /// Pivot raw sales rows into a dense table.
  pub fn from_records(records: &[SalesRecord]) -> Self {
    let dates: Vec<NaiveDate> = records
      .iter()
      .map(|r| r.date)
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    // sku -> date -> (sum, count)
    let mut cells: BTreeMap<&str, BTreeMap<NaiveDate, (f64, u32)>> = BTreeMap::new();
    for r in records {
      let cell = cells
        .entry(r.sku.as_str())
        .or_default()
        .entry(r.date)
        .or_insert((0.0, 0));
      cell.0 += r.qty as f64;
      cell.1 += 1;
    }

    let columns = cells
      .into_iter()
      .map(|(sku, by_date)| SkuSeries {
        sku:    sku.to_owned(),
        values: dates
          .iter()
          .map(|d| match by_date.get(d) {
            Some(&(sum, count)) => sum / f64::from(count),
            None => 0.0,
          })
          .collect(),
      })
      .collect();

    Self { dates, columns }
  }

  /// Assemble a table from already-aligned columns. Columns longer than
  /// `dates` are truncated; shorter ones are zero-padded.
  pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<SkuSeries>) -> Self {
    let len = dates.len();
    let columns = columns
      .into_iter()
      .map(|mut c| {
        c.values.resize(len, 0.0);
        c
      })
      .collect();
    Self { dates, columns }
  }

  /// `true` when the tenant had no sales at all.
  pub fn is_empty(&self) -> bool { self.dates.is_empty() || self.columns.is_empty() }

  /// Number of date rows.
  pub fn len(&self) -> usize { self.dates.len() }

  pub fn dates(&self) -> &[NaiveDate] { &self.dates }

  pub fn columns(&self) -> &[SkuSeries] { &self.columns }

  pub fn skus(&self) -> impl Iterator<Item = &str> {
    self.columns.iter().map(|c| c.sku.as_str())
  }

  /// The quantity series of one SKU, if it was observed.
  pub fn series(&self, sku: &str) -> Option<&[f64]> {
    self
      .columns
      .iter()
      .find(|c| c.sku == sku)
      .map(|c| c.values.as_slice())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 1, d).unwrap() }

  fn rec(sku: &str, d: u32, qty: i64) -> SalesRecord {
    SalesRecord { tenant_id: Uuid::nil(), sku: sku.into(), date: day(d), qty }
  }

  #[test]
  fn empty_records_give_empty_table() {
    let table = SalesTable::from_records(&[]);
    assert!(table.is_empty());
    assert_eq!(table.len(), 0);
    assert_eq!(table.skus().count(), 0);
  }

  #[test]
  fn pivot_fills_missing_cells_with_zero() {
    let table = SalesTable::from_records(&[
      rec("B", 1, 3),
      rec("A", 1, 5),
      rec("A", 2, 7),
      rec("B", 3, 1),
    ]);

    assert_eq!(table.dates(), &[day(1), day(2), day(3)]);
    assert_eq!(table.skus().collect::<Vec<_>>(), vec!["A", "B"]);
    assert_eq!(table.series("A").unwrap(), &[5.0, 7.0, 0.0]);
    assert_eq!(table.series("B").unwrap(), &[3.0, 0.0, 1.0]);
    assert!(table.series("C").is_none());
  }

  #[test]
  fn dates_sorted_even_when_input_is_not() {
    let table = SalesTable::from_records(&[rec("A", 9, 1), rec("A", 2, 4)]);
    assert_eq!(table.dates(), &[day(2), day(9)]);
    assert_eq!(table.series("A").unwrap(), &[4.0, 1.0]);
  }

  #[test]
  fn duplicate_cells_are_averaged() {
    let table = SalesTable::from_records(&[rec("A", 1, 2), rec("A", 1, 6)]);
    assert_eq!(table.series("A").unwrap(), &[4.0]);
  }

  #[test]
  fn from_columns_aligns_lengths() {
    let table = SalesTable::from_columns(
      vec![day(1), day(2)],
      vec![SkuSeries { sku: "A".into(), values: vec![1.0] }],
    );
    assert_eq!(table.series("A").unwrap(), &[1.0, 0.0]);
  }
}
