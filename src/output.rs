//! Output module for azcost
//!
//! Two kinds of output live here:
//!
//! - [`CsvReportWriter`] persists each [`CostReport`] as `cost_by_<dimension>.csv`.
//!   Files are written to a temporary file in the output directory and renamed
//!   into place, so a failed run never leaves a half-written report behind.
//! - [`OutputFormatter`] renders a run summary for the terminal, either as a
//!   table or as JSON.
//!
//! # Examples
//!
//! ```no_run
//! use azcost::aggregation::CostReport;
//! use azcost::dimension::ReportDimension;
//! use azcost::output::CsvReportWriter;
//!
//! let writer = CsvReportWriter::new("out");
//! let path = writer.write_report(&CostReport::empty(ReportDimension::Account))?;
//! assert!(path.ends_with("cost_by_account.csv"));
//! # Ok::<(), azcost::AzcostError>(())
//! ```

use crate::aggregation::{CostReport, Totals};
use crate::dimension::ReportDimension;
use crate::error::{AzcostError, Result};
use prettytable::{Cell, Row, Table, format, row};
use rust_decimal::Decimal;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{error, info};

/// Header row of every report
pub const REPORT_HEADER: [&str; 2] = ["key", "total_cost"];

/// Render a cost with at least two decimal places
///
/// Amounts carrying more precision keep it; nothing is rounded away.
///
/// ```
/// use azcost::output::format_cost;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_cost(Decimal::new(155, 1)), "15.50");
/// assert_eq!(format_cost(Decimal::new(3, 0)), "3.00");
/// assert_eq!(format_cost(Decimal::new(12345, 4)), "1.2345");
/// ```
pub fn format_cost(amount: Decimal) -> String {
    let mut amount = amount;
    if amount.scale() < 2 {
        amount.rescale(2);
    }
    amount.to_string()
}

/// Render a report as CSV bytes
///
/// Output is a `key,total_cost` header followed by one line per group in
/// report order, `\n` line endings, fields quoted only when needed. The same
/// report always renders to the same bytes.
pub fn render_report(report: &CostReport) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(REPORT_HEADER)?;
    for row in &report.rows {
        writer.write_record([row.key.as_str(), format_cost(row.total_cost).as_str()])?;
    }

    writer
        .into_inner()
        .map_err(|e| AzcostError::Io(e.into_error()))
}

/// Writes cost reports into an output directory
#[derive(Debug, Clone)]
pub struct CsvReportWriter {
    out_dir: PathBuf,
}

impl CsvReportWriter {
    /// Create a writer for `out_dir`; the directory is created on first write
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Directory reports are written to
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Path a dimension's report is written to
    pub fn report_path(&self, dimension: ReportDimension) -> PathBuf {
        self.out_dir.join(dimension.file_name())
    }

    /// Write one report, replacing any existing file atomically
    ///
    /// # Errors
    ///
    /// Returns [`AzcostError::Emission`] when the directory or file cannot be
    /// created, written, or renamed into place.
    pub fn write_report(&self, report: &CostReport) -> Result<PathBuf> {
        let path = self.report_path(report.dimension);
        let bytes = render_report(report)?;

        fs::create_dir_all(&self.out_dir).map_err(|source| AzcostError::Emission {
            path: self.out_dir.clone(),
            source,
        })?;

        let emission_error = |source: std::io::Error| AzcostError::Emission {
            path: path.clone(),
            source,
        };

        let mut temp = NamedTempFile::new_in(&self.out_dir).map_err(emission_error)?;
        temp.write_all(&bytes).map_err(emission_error)?;
        temp.as_file().sync_all().map_err(emission_error)?;
        temp.persist(&path).map_err(|e| emission_error(e.error))?;

        info!(
            "Wrote {} ({} row(s))",
            path.display(),
            report.rows.len()
        );
        Ok(path)
    }

    /// Write every report, continuing past failures
    ///
    /// Returns one result per report in input order.
    pub fn write_all(&self, reports: &[CostReport]) -> Vec<(ReportDimension, Result<PathBuf>)> {
        reports
            .iter()
            .map(|report| {
                let result = self.write_report(report);
                if let Err(e) = &result {
                    error!("Could not write {} report: {}", report.dimension, e);
                }
                (report.dimension, result)
            })
            .collect()
    }
}

/// Trait for run-summary formatters
pub trait OutputFormatter {
    /// Format the reports of a run together with its totals
    fn format_summary(&self, reports: &[CostReport], totals: &Totals) -> String;
}

/// Table formatter for human-readable output
pub struct TableFormatter;

impl TableFormatter {
    fn format_currency(amount: Decimal) -> String {
        format!("{:.2}", amount)
    }

    fn format_report_total(report: &CostReport) -> String {
        match report.total() {
            Ok(total) => Self::format_currency(total),
            Err(_) => "overflow".to_string(),
        }
    }

    fn format_report(report: &CostReport) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        table.set_titles(row![
            b -> format!("Cost by {}", report.dimension),
            b -> "Total Cost"
        ]);

        for entry in &report.rows {
            table.add_row(row![
                entry.key,
                r -> Self::format_currency(entry.total_cost)
            ]);
        }

        // Add separator
        table.add_row(Row::new(vec![Cell::new(""); 2]));

        table.add_row(row![
            b -> "TOTAL",
            b -> Self::format_report_total(report)
        ]);

        table.to_string()
    }
}

impl OutputFormatter for TableFormatter {
    fn format_summary(&self, reports: &[CostReport], totals: &Totals) -> String {
        let mut output = String::new();
        for report in reports {
            output.push_str(&Self::format_report(report));
            output.push('\n');
        }
        output.push_str(&format!(
            "{} record(s), {} skipped, total cost {}\n",
            totals.records,
            totals.skipped,
            Self::format_currency(totals.total_cost)
        ));
        output
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_summary(&self, reports: &[CostReport], totals: &Totals) -> String {
        let reports: Vec<_> = reports
            .iter()
            .map(|report| {
                json!({
                    "dimension": report.dimension,
                    "file": report.dimension.file_name(),
                    "rows": report.rows.iter().map(|row| json!({
                        "key": row.key,
                        "total_cost": format_cost(row.total_cost),
                    })).collect::<Vec<_>>(),
                    "total_cost": report.total().ok().map(format_cost),
                })
            })
            .collect();

        let output = json!({
            "reports": reports,
            "totals": {
                "records": totals.records,
                "skipped": totals.skipped,
                "total_cost": format_cost(totals.total_cost),
            }
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Get the appropriate formatter based on output preference
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}
