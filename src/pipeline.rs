//! End-to-end report run: ingest, aggregate, emit
//!
//! [`run_reports`] is what the binary calls. It fetches the export once,
//! builds all four reports from the same in-memory records, and attempts to
//! write every report even if an earlier one failed.

use crate::aggregation::{Aggregator, CostReport, Totals};
use crate::config::ReportConfig;
use crate::dimension::ReportDimension;
use crate::error::{AzcostError, Result};
use crate::ingest::collect_records;
use crate::output::CsvReportWriter;
use azcost_source_blob::DataLoader;
use chrono::Local;
use std::path::PathBuf;
use tracing::{error, info};

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One report per dimension, in [`ReportDimension::ALL`] order
    pub reports: Vec<CostReport>,
    /// Files written successfully
    pub written: Vec<PathBuf>,
    /// Dimensions whose file could not be written, with the error message
    pub failures: Vec<(ReportDimension, String)>,
    pub totals: Totals,
}

impl RunSummary {
    /// Convert emission failures into the run's overall result
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(AzcostError::ReportsFailed {
                failed: self.failures.len(),
            })
        }
    }
}

/// Run ingestion and aggregation with a pre-built loader
///
/// Split out from [`run_reports`] so tests can plug in any `BillingSource`.
pub async fn build_reports(
    loader: &DataLoader,
    config: &ReportConfig,
) -> Result<(Vec<CostReport>, Totals)> {
    info!("Loading billing export from {}", loader.location());

    let records = config.filter.filter_stream(loader.load_records());
    let outcome = collect_records(records, config.policy).await?;

    let reports = Aggregator::new().aggregate_all(&outcome.records, &ReportDimension::ALL)?;
    let totals = Totals::from_records(&outcome.records, outcome.skipped)?;
    Ok((reports, totals))
}

/// Fetch the export named by `config` and write all reports
///
/// Ingestion and aggregation errors abort the run before anything is
/// written. Emission failures are collected in the returned summary; call
/// [`RunSummary::into_result`] to turn them into an error.
pub async fn run_reports(config: &ReportConfig) -> Result<RunSummary> {
    let loader = DataLoader::new(config.source.clone())?
        .with_raw_copy(config.raw_copy_path(Local::now()));
    run_with_loader(&loader, config).await
}

/// [`run_reports`] over an already constructed loader
pub async fn run_with_loader(loader: &DataLoader, config: &ReportConfig) -> Result<RunSummary> {
    let (reports, totals) = build_reports(loader, config).await?;

    let writer = CsvReportWriter::new(&config.out_dir);
    let mut written = Vec::new();
    let mut failures = Vec::new();
    for (dimension, result) in writer.write_all(&reports) {
        match result {
            Ok(path) => written.push(path),
            Err(e) => failures.push((dimension, e.to_string())),
        }
    }

    if failures.is_empty() {
        info!(
            "Wrote {} report(s) to {}",
            written.len(),
            config.out_dir.display()
        );
    } else {
        error!(
            "{} of {} report(s) could not be written",
            failures.len(),
            reports.len()
        );
    }

    Ok(RunSummary {
        reports,
        written,
        failures,
        totals,
    })
}
