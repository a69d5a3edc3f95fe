//! azcost - Aggregate Azure billing exports into cost reports
//!
//! This library provides functionality to:
//! - Fetch a billing export from Azure Blob Storage (SAS URL) or a local file
//! - Parse it into billing records, skipping or rejecting malformed rows
//! - Sum costs by account, meter category, month and subscription
//! - Write one CSV report per dimension and summarize the run in the terminal
//!
//! # Examples
//!
//! ```no_run
//! use azcost::{
//!     aggregation::Aggregator,
//!     dimension::ReportDimension,
//!     ingest::{MalformedPolicy, collect_records},
//!     output::CsvReportWriter,
//!     source::SourceLocation,
//! };
//! use azcost_source_blob::DataLoader;
//!
//! #[tokio::main]
//! async fn main() -> azcost::Result<()> {
//!     let loader = DataLoader::new(SourceLocation::parse("exports/june.csv")?)?;
//!     let outcome = collect_records(loader.load_records(), MalformedPolicy::Skip).await?;
//!
//!     let reports = Aggregator::new().aggregate_all(&outcome.records, &ReportDimension::ALL)?;
//!     for (_, result) in CsvReportWriter::new("out").write_all(&reports) {
//!         result?;
//!     }
//!     Ok(())
//! }
//! ```

pub use azcost_core::{dimension, error, source, types};

pub mod aggregation;
pub mod cli;
pub mod config;
pub mod filters;
pub mod ingest;
pub mod output;
pub mod pipeline;

// Re-export commonly used types
pub use error::{AzcostError, Result};
pub use types::{BillingMonth, BillingRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
