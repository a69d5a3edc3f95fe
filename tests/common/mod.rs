//! Common test utilities and helpers for azcost tests
//!
//! Builders for billing records and for export files on disk.

use azcost::{
    config::ReportConfig, filters::RecordFilter, ingest::MalformedPolicy,
    source::SourceLocation, types::BillingRecord,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tempfile::TempDir;

/// Header of the exports written by [`ExportBuilder`]
pub const EXPORT_HEADER: &str =
    "AccountName,SubscriptionId,SubscriptionName,MeterCategory,MeterName,Date,CostInBillingCurrency";

/// Builder for creating test BillingRecord instances
#[derive(Clone)]
pub struct RecordBuilder {
    record: BillingRecord,
}

#[allow(dead_code)]
impl RecordBuilder {
    /// A record for account `A1` on 2024-01-15 costing 1.00
    pub fn new() -> Self {
        Self {
            record: BillingRecord {
                account_name: Some("A1".to_string()),
                subscription_id: Some("00000000-0000-0000-0000-000000000001".to_string()),
                subscription_name: Some("Production".to_string()),
                meter_category: Some("Storage".to_string()),
                meter_name: Some("LRS Data Stored".to_string()),
                date: NaiveDate::from_ymd_opt(2024, 1, 15),
                cost: Decimal::ONE,
            },
        }
    }

    pub fn account(mut self, account: Option<&str>) -> Self {
        self.record.account_name = account.map(str::to_string);
        self
    }

    pub fn meter(mut self, meter: Option<&str>) -> Self {
        self.record.meter_category = meter.map(str::to_string);
        self
    }

    pub fn subscription(mut self, name: Option<&str>) -> Self {
        self.record.subscription_name = name.map(str::to_string);
        self
    }

    pub fn date(mut self, year: i32, month: u32, day: u32) -> Self {
        self.record.date = NaiveDate::from_ymd_opt(year, month, day);
        self
    }

    pub fn cost(mut self, cost: Decimal) -> Self {
        self.record.cost = cost;
        self
    }

    pub fn build(self) -> BillingRecord {
        self.record
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for export CSV files
#[derive(Default)]
pub struct ExportBuilder {
    lines: Vec<String>,
}

#[allow(dead_code)]
impl ExportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row in [`EXPORT_HEADER`] column order
    pub fn row(mut self, account: &str, subscription: &str, meter: &str, date: &str, cost: &str) -> Self {
        self.lines.push(format!(
            "{account},sub-{subscription},{subscription},{meter},Meter,{date},{cost}"
        ));
        self
    }

    /// Add a line verbatim
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn build(&self) -> String {
        let mut export = String::from(EXPORT_HEADER);
        export.push('\n');
        for line in &self.lines {
            export.push_str(line);
            export.push('\n');
        }
        export
    }
}

/// A temporary workspace with an export file and an output directory
pub struct TestWorkspace {
    pub dir: TempDir,
    pub export: PathBuf,
    pub out_dir: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    pub fn with_export(contents: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let export = dir.path().join("billing.csv");
        std::fs::write(&export, contents).expect("write export");
        let out_dir = dir.path().join("out");
        Self {
            dir,
            export,
            out_dir,
        }
    }

    /// A config reading this workspace's export with the skip policy
    pub fn config(&self) -> ReportConfig {
        ReportConfig {
            source: SourceLocation::Local(self.export.clone()),
            out_dir: self.out_dir.clone(),
            policy: MalformedPolicy::Skip,
            filter: RecordFilter::new(),
            keep_raw: false,
            json: false,
        }
    }

    pub fn report(&self, file_name: &str) -> String {
        std::fs::read_to_string(self.out_dir.join(file_name)).expect("read report")
    }
}
