//! Filtering module for billing records
//!
//! Restricts records to a range of billing months before aggregation.
//!
//! # Examples
//!
//! ```
//! use azcost::filters::RecordFilter;
//! use azcost::types::BillingMonth;
//!
//! // Only Q1 2024
//! let filter = RecordFilter::new()
//!     .with_since(BillingMonth::new(2024, 1).unwrap())
//!     .with_until(BillingMonth::new(2024, 3).unwrap());
//! assert!(filter.is_active());
//! ```

use crate::error::Result;
use crate::types::{BillingMonth, BillingRecord};
use futures::{Stream, StreamExt};

/// Month-range filter for billing records
///
/// Both bounds are inclusive. A record without a usage date cannot be placed
/// in a month, so it only passes when no bound is set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecordFilter {
    /// First month to keep
    pub since: Option<BillingMonth>,
    /// Last month to keep
    pub until: Option<BillingMonth>,
}

impl RecordFilter {
    /// Create a new filter with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start month
    pub fn with_since(mut self, month: BillingMonth) -> Self {
        self.since = Some(month);
        self
    }

    /// Set the end month
    pub fn with_until(mut self, month: BillingMonth) -> Self {
        self.until = Some(month);
        self
    }

    /// Whether any bound is set
    pub fn is_active(&self) -> bool {
        self.since.is_some() || self.until.is_some()
    }

    /// Check if a record passes the filter
    pub fn matches(&self, record: &BillingRecord) -> bool {
        if !self.is_active() {
            return true;
        }

        let Some(month) = record.month() else {
            return false;
        };

        if let Some(since) = self.since
            && month < since
        {
            return false;
        }

        if let Some(until) = self.until
            && month > until
        {
            return false;
        }

        true
    }

    /// Filter a stream of records
    ///
    /// Errors pass through untouched so the ingestion policy still sees them.
    pub fn filter_stream<S>(self, stream: S) -> impl Stream<Item = Result<BillingRecord>>
    where
        S: Stream<Item = Result<BillingRecord>>,
    {
        stream.filter(move |result| {
            let keep = match result {
                Ok(record) => self.matches(record),
                Err(_) => true,
            };
            futures::future::ready(keep)
        })
    }
}
