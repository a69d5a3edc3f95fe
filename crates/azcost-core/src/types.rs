//! Core domain types for azcost
//!
//! This module contains the billing record read from an Azure Cost Management
//! export, the raw CSV row it is parsed from, and the `BillingMonth` used for
//! monthly grouping and filtering.

use crate::error::{AzcostError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Header of the cost column after canonicalisation
pub const COST_COLUMN: &str = "CostInBillingCurrency";

/// Canonical export columns and the header spellings accepted for each
///
/// Headers are matched case-insensitively (MCA exports use camelCase) and,
/// for each column, the first alias present wins. Current EA and MCA exports
/// call the cost `CostInBillingCurrency`; older usage-details exports use
/// `PreTaxCost` or `Cost`.
pub const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("AccountName", &["AccountName"]),
    ("SubscriptionId", &["SubscriptionId", "SubscriptionGuid"]),
    ("SubscriptionName", &["SubscriptionName"]),
    ("MeterCategory", &["MeterCategory"]),
    ("MeterName", &["MeterName"]),
    ("Date", &["Date", "UsageDateTime"]),
    (COST_COLUMN, &[COST_COLUMN, "PreTaxCost", "Cost"]),
];

/// Calendar month used to bucket and filter billing records
///
/// # Examples
/// ```
/// use azcost_core::types::BillingMonth;
///
/// let month: BillingMonth = "2024-03".parse().unwrap();
/// assert_eq!(month.to_string(), "2024-03");
/// assert!(month > BillingMonth::new(2024, 2).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillingMonth {
    year: i32,
    month: u32,
}

impl BillingMonth {
    /// Create a month, returning `None` when `month` is outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Month containing the given date
    pub fn from_date(date: &NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingMonth {
    type Err = AzcostError;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s.trim().split_once('-').ok_or_else(|| {
            AzcostError::InvalidArgument(format!("Invalid month '{s}', expected YYYY-MM"))
        })?;
        let year = year
            .parse::<i32>()
            .map_err(|_| AzcostError::InvalidArgument(format!("Invalid year in '{s}'")))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| AzcostError::InvalidArgument(format!("Invalid month in '{s}'")))?;

        BillingMonth::new(year, month).ok_or_else(|| {
            AzcostError::InvalidArgument(format!("Month must be between 1-12, got {month}"))
        })
    }
}

/// One row of a billing export exactly as it appears in the CSV
///
/// Every field is optional so that a bad row can be reported with its line
/// number instead of failing the whole deserialization. Field names are the
/// canonical names from [`COLUMN_ALIASES`]; unknown columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBillingRow {
    #[serde(rename = "AccountName", default)]
    pub account_name: Option<String>,
    #[serde(rename = "SubscriptionId", default)]
    pub subscription_id: Option<String>,
    #[serde(rename = "SubscriptionName", default)]
    pub subscription_name: Option<String>,
    #[serde(rename = "MeterCategory", default)]
    pub meter_category: Option<String>,
    #[serde(rename = "MeterName", default)]
    pub meter_name: Option<String>,
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
    #[serde(rename = "CostInBillingCurrency", default)]
    pub cost: Option<String>,
}

/// A single billing record
///
/// Records are immutable once ingested; aggregation only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRecord {
    /// Enrollment account name
    pub account_name: Option<String>,
    /// Subscription GUID
    pub subscription_id: Option<String>,
    /// Subscription display name
    pub subscription_name: Option<String>,
    /// Meter category (service family such as "Virtual Machines")
    pub meter_category: Option<String>,
    /// Meter name within the category
    pub meter_name: Option<String>,
    /// Usage date
    pub date: Option<NaiveDate>,
    /// Cost in billing currency
    pub cost: Decimal,
}

impl BillingRecord {
    /// Convert a raw CSV row into a record
    ///
    /// `line` is the 1-based line number used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`AzcostError::MalformedRecord`] when the cost is missing or not
    /// a number, the date is present but unreadable, or the row carries no
    /// value for any report dimension.
    pub fn from_raw(raw: RawBillingRow, line: u64) -> Result<Self> {
        let malformed = |reason: String| AzcostError::MalformedRecord { line, reason };

        let cost = match non_blank(raw.cost) {
            Some(text) => parse_cost(&text)
                .ok_or_else(|| malformed(format!("cost '{text}' is not a decimal number")))?,
            None => return Err(malformed("missing cost".to_string())),
        };

        let date = match non_blank(raw.date) {
            Some(text) => Some(
                parse_billing_date(&text)
                    .ok_or_else(|| malformed(format!("unrecognised date '{text}'")))?,
            ),
            None => None,
        };

        let record = Self {
            account_name: non_blank(raw.account_name),
            subscription_id: non_blank(raw.subscription_id),
            subscription_name: non_blank(raw.subscription_name),
            meter_category: non_blank(raw.meter_category),
            meter_name: non_blank(raw.meter_name),
            date,
            cost,
        };

        if !record.has_dimension_value() {
            return Err(malformed("row has no account, meter, date or subscription".to_string()));
        }

        Ok(record)
    }

    /// Billing month of the usage date, if the record has one
    pub fn month(&self) -> Option<BillingMonth> {
        self.date.as_ref().map(BillingMonth::from_date)
    }

    /// Whether at least one report dimension has a value
    pub fn has_dimension_value(&self) -> bool {
        self.account_name.is_some()
            || self.subscription_id.is_some()
            || self.subscription_name.is_some()
            || self.meter_category.is_some()
            || self.date.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a cost cell
///
/// Exports write small amounts in scientific notation (`1.2E-05`), so that
/// form is accepted alongside plain decimals.
pub fn parse_cost(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Parse the `Date` column
///
/// Accepts ISO dates (`2024-01-31`), US-style dates used by EA exports
/// (`01/31/2024`), and full timestamps.
pub fn parse_billing_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|dt| dt.date())
}
