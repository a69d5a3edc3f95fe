//! Aggregation module for summarizing billing records
//!
//! This module groups billing records by a [`ReportDimension`] and sums their
//! costs. One routine serves all four reports; the dimension decides which
//! field of the record becomes the group key.
//!
//! Costs are `rust_decimal::Decimal` throughout, so per-group sums are exact
//! and the order records arrive in never changes a total.
//!
//! # Examples
//!
//! ```
//! use azcost::aggregation::Aggregator;
//! use azcost::dimension::ReportDimension;
//! use azcost::types::BillingRecord;
//! use rust_decimal::Decimal;
//!
//! let record = |account: &str, cents: i64| BillingRecord {
//!     account_name: Some(account.to_string()),
//!     subscription_id: None,
//!     subscription_name: None,
//!     meter_category: None,
//!     meter_name: None,
//!     date: None,
//!     cost: Decimal::new(cents, 2),
//! };
//! let records = vec![record("A1", 1000), record("A1", 550), record("A2", 300)];
//!
//! let report = Aggregator::new().aggregate(&records, ReportDimension::Account)?;
//! assert_eq!(report.get("A1"), Some(Decimal::new(1550, 2)));
//! assert_eq!(report.get("A2"), Some(Decimal::new(300, 2)));
//! # Ok::<(), azcost::AzcostError>(())
//! ```

use crate::dimension::ReportDimension;
use crate::error::{AzcostError, Result};
use crate::types::BillingRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One line of a cost report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Group key (account name, meter category, `YYYY-MM`, subscription)
    pub key: String,
    /// Sum of the costs of every record in the group
    pub total_cost: Decimal,
}

/// Cost totals for one dimension, ordered by key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostReport {
    /// Dimension the rows are grouped by
    pub dimension: ReportDimension,
    /// One row per group, sorted by key
    pub rows: Vec<ReportRow>,
}

impl CostReport {
    /// An empty report for a dimension
    pub fn empty(dimension: ReportDimension) -> Self {
        Self {
            dimension,
            rows: Vec::new(),
        }
    }

    /// Sum of all group totals
    ///
    /// # Errors
    ///
    /// Returns [`AzcostError::Aggregation`] if the sum does not fit in a
    /// `Decimal`.
    pub fn total(&self) -> Result<Decimal> {
        checked_sum(self.rows.iter().map(|row| row.total_cost)).ok_or_else(|| {
            AzcostError::Aggregation(format!("{} report total overflowed", self.dimension))
        })
    }

    /// Total for one key, if the key is present
    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.rows
            .iter()
            .find(|row| row.key == key)
            .map(|row| row.total_cost)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sum costs without panicking; `None` when the sum leaves `Decimal`'s range
pub fn checked_sum<I>(costs: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    costs
        .into_iter()
        .try_fold(Decimal::ZERO, |total, cost| total.checked_add(cost))
}

/// Internal accumulator for one report
struct CostAccumulator {
    dimension: ReportDimension,
    groups: BTreeMap<String, Decimal>,
}

impl CostAccumulator {
    fn new(dimension: ReportDimension) -> Self {
        Self {
            dimension,
            groups: BTreeMap::new(),
        }
    }

    fn add_record(&mut self, record: &BillingRecord) -> Result<()> {
        // Ingestion drops such rows; reaching here means a caller bypassed it
        if !record.has_dimension_value() {
            return Err(AzcostError::Aggregation(format!(
                "record with cost {} has no dimension values",
                record.cost
            )));
        }

        let key = self.dimension.key_for(record);
        match self.groups.get_mut(key.as_ref()) {
            Some(total) => {
                *total = total.checked_add(record.cost).ok_or_else(|| {
                    AzcostError::Aggregation(format!(
                        "cost total overflowed for {} '{}'",
                        self.dimension, key
                    ))
                })?;
            }
            None => {
                self.groups.insert(key.into_owned(), record.cost);
            }
        }
        Ok(())
    }

    fn into_report(self) -> CostReport {
        CostReport {
            dimension: self.dimension,
            rows: self
                .groups
                .into_iter()
                .map(|(key, total_cost)| ReportRow { key, total_cost })
                .collect(),
        }
    }
}

/// Main aggregation engine for cost reports
///
/// Holds no state between calls; each report is computed independently from
/// the shared, read-only record slice.
#[derive(Debug, Default, Clone, Copy)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Group records by `dimension` and sum their costs
    ///
    /// Records with no value for the dimension are grouped under
    /// [`crate::dimension::UNASSIGNED_KEY`].
    ///
    /// # Errors
    ///
    /// Returns [`AzcostError::Aggregation`] if a record carries no dimension
    /// value at all, or if a group total or the report total overflows.
    pub fn aggregate<'a, I>(&self, records: I, dimension: ReportDimension) -> Result<CostReport>
    where
        I: IntoIterator<Item = &'a BillingRecord>,
    {
        let mut accumulator = CostAccumulator::new(dimension);
        for record in records {
            accumulator.add_record(record)?;
        }

        let report = accumulator.into_report();
        // Group totals can each fit while their sum does not
        report.total()?;
        debug!(
            "Aggregated {} group(s) by {} ({})",
            report.len(),
            dimension,
            dimension.source_column()
        );
        Ok(report)
    }

    /// Build one report per dimension over the same records
    pub fn aggregate_all(
        &self,
        records: &[BillingRecord],
        dimensions: &[ReportDimension],
    ) -> Result<Vec<CostReport>> {
        dimensions
            .iter()
            .map(|&dimension| self.aggregate(records, dimension))
            .collect()
    }
}

/// Run-level totals shown in the summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Records that made it into the reports
    pub records: usize,
    /// Malformed rows skipped during ingestion
    pub skipped: usize,
    /// Sum of every record's cost
    pub total_cost: Decimal,
}

impl Totals {
    /// Totals over the ingested records
    pub fn from_records(records: &[BillingRecord], skipped: usize) -> Result<Self> {
        let total_cost = checked_sum(records.iter().map(|r| r.cost)).ok_or_else(|| {
            AzcostError::Aggregation("total cost of the export overflowed".to_string())
        })?;
        Ok(Self {
            records: records.len(),
            skipped,
            total_cost,
        })
    }
}
