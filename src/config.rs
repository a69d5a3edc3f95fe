//! Run configuration resolved from the command line and environment
//!
//! `STORAGE_URL` and `OUT_FOLDER` are read by clap; [`load_dotenv`] makes a
//! `.env` file in the working directory visible to clap before parsing.

use crate::cli::Cli;
use crate::error::{AzcostError, Result};
use crate::filters::RecordFilter;
use crate::ingest::MalformedPolicy;
use crate::source::SourceLocation;
use crate::types::BillingMonth;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the output folder holding raw export copies
pub const RAW_DIR: &str = "raw";

/// Load a `.env` file from the working directory, if there is one
///
/// Variables already set in the environment win over the file.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => debug!("Ignoring .env file: {}", e),
    }
}

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub source: SourceLocation,
    pub out_dir: PathBuf,
    pub policy: MalformedPolicy,
    pub filter: RecordFilter,
    pub keep_raw: bool,
    pub json: bool,
}

impl ReportConfig {
    /// Validate the parsed command line
    ///
    /// # Errors
    ///
    /// [`AzcostError::Config`] when no source is given, and the parse errors
    /// of [`SourceLocation::parse`] and [`BillingMonth`] otherwise.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let source = cli.source.as_deref().ok_or_else(|| {
            AzcostError::Config(
                "Source is required. Have you set the STORAGE_URL env variable?".to_string(),
            )
        })?;
        let source = SourceLocation::parse(source)?;

        let mut filter = RecordFilter::new();
        if let Some(since) = &cli.since {
            filter = filter.with_since(since.parse::<BillingMonth>()?);
        }
        if let Some(until) = &cli.until {
            filter = filter.with_until(until.parse::<BillingMonth>()?);
        }
        if let (Some(since), Some(until)) = (filter.since, filter.until)
            && since > until
        {
            return Err(AzcostError::InvalidArgument(format!(
                "--since {since} is after --until {until}"
            )));
        }

        Ok(Self {
            source,
            out_dir: cli.out.clone(),
            policy: cli.on_malformed,
            filter,
            keep_raw: cli.keep_raw,
            json: cli.json,
        })
    }

    /// Where the raw export copy goes for a run started at `started`
    ///
    /// `None` unless `--keep-raw` was given.
    pub fn raw_copy_path(&self, started: DateTime<Local>) -> Option<PathBuf> {
        self.keep_raw
            .then(|| raw_copy_path(&self.out_dir, started))
    }
}

/// `<out>/raw/<YYYYMMDDTHHMMSS>.billing.csv`
pub fn raw_copy_path(out_dir: &Path, started: DateTime<Local>) -> PathBuf {
    out_dir
        .join(RAW_DIR)
        .join(format!("{}.billing.csv", started.format("%Y%m%dT%H%M%S")))
}
