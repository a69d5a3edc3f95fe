//! Report dimensions
//!
//! A [`ReportDimension`] names the field that a cost report groups by. The
//! four reports produced by azcost are the four variants of this enum, and a
//! single aggregation routine is driven by it.

use crate::types::BillingRecord;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Group key used when a record has no value for the chosen dimension
///
/// A real value spelled the same way is escaped by [`ReportDimension::key_for`]
/// and never lands in this bucket.
pub const UNASSIGNED_KEY: &str = "(none)";

/// Prefix marking an escaped key
pub const KEY_ESCAPE: char = '\\';

/// Keep real values apart from [`UNASSIGNED_KEY`]
///
/// A value equal to the sentinel, or already starting with [`KEY_ESCAPE`],
/// gets one more `KEY_ESCAPE` in front. Every other value is used as is, so
/// distinct values always give distinct keys.
///
/// ```
/// use azcost_core::dimension::escape_key;
///
/// assert_eq!(escape_key("Storage"), "Storage");
/// assert_eq!(escape_key("(none)"), "\\(none)");
/// assert_eq!(escape_key("\\(none)"), "\\\\(none)");
/// ```
pub fn escape_key(value: &str) -> Cow<'_, str> {
    if value == UNASSIGNED_KEY || value.starts_with(KEY_ESCAPE) {
        Cow::Owned(format!("{KEY_ESCAPE}{value}"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Field by which costs are grouped and summed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportDimension {
    /// Enrollment account (`AccountName`)
    Account,
    /// Meter category (`MeterCategory`)
    Meter,
    /// Usage month derived from `Date`
    Month,
    /// Subscription (`SubscriptionName`, falling back to `SubscriptionId`)
    Subscription,
}

impl ReportDimension {
    /// All dimensions in report order
    pub const ALL: [ReportDimension; 4] = [
        ReportDimension::Account,
        ReportDimension::Meter,
        ReportDimension::Month,
        ReportDimension::Subscription,
    ];

    /// Lowercase name used in file names and JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportDimension::Account => "account",
            ReportDimension::Meter => "meter",
            ReportDimension::Month => "month",
            ReportDimension::Subscription => "subscription",
        }
    }

    /// Name of the CSV file this dimension's report is written to
    ///
    /// ```
    /// use azcost_core::dimension::ReportDimension;
    ///
    /// assert_eq!(ReportDimension::Meter.file_name(), "cost_by_meter.csv");
    /// ```
    pub fn file_name(&self) -> String {
        format!("cost_by_{}.csv", self.as_str())
    }

    /// Export column(s) the dimension is read from, for log messages
    pub fn source_column(&self) -> &'static str {
        match self {
            ReportDimension::Account => "AccountName",
            ReportDimension::Meter => "MeterCategory",
            ReportDimension::Month => "Date",
            ReportDimension::Subscription => "SubscriptionName/SubscriptionId",
        }
    }

    /// Value of this dimension for a record, `None` when the record has none
    pub fn value_of<'a>(&self, record: &'a BillingRecord) -> Option<Cow<'a, str>> {
        match self {
            ReportDimension::Account => record.account_name.as_deref().map(Cow::Borrowed),
            ReportDimension::Meter => record.meter_category.as_deref().map(Cow::Borrowed),
            ReportDimension::Month => record.month().map(|m| Cow::Owned(m.to_string())),
            ReportDimension::Subscription => record
                .subscription_name
                .as_deref()
                .or(record.subscription_id.as_deref())
                .map(Cow::Borrowed),
        }
    }

    /// Group key for a record, using [`UNASSIGNED_KEY`] when the value is missing
    pub fn key_for<'a>(&self, record: &'a BillingRecord) -> Cow<'a, str> {
        match self.value_of(record) {
            Some(Cow::Borrowed(value)) => escape_key(value),
            Some(Cow::Owned(value)) => Cow::Owned(escape_key(&value).into_owned()),
            None => Cow::Borrowed(UNASSIGNED_KEY),
        }
    }
}

impl fmt::Display for ReportDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
