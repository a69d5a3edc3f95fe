//! CLI interface for azcost
//!
//! This module defines the command-line interface using clap. There is a
//! single command: fetch one billing export and write the four cost reports.
//!
//! # Example
//!
//! ```bash
//! # Reports from a blob SAS URL into ./out
//! azcost --source "https://acct.blob.core.windows.net/exports/june.csv?sv=..."
//!
//! # Source and output from the environment (or a .env file)
//! STORAGE_URL=exports/june.csv OUT_FOLDER=reports azcost
//!
//! # First quarter only, stop on the first bad row, JSON summary
//! azcost -s june.csv --since 2024-01 --until 2024-03 --on-malformed abort --json
//! ```

use crate::ingest::MalformedPolicy;
use clap::Parser;
use std::path::PathBuf;

/// Aggregate an Azure billing export into cost reports
#[derive(Parser, Debug, Clone)]
#[command(name = "azcost")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Billing export location: blob URL with SAS token, file:// URL, or local path
    #[arg(long, short = 's', env = "STORAGE_URL", hide_env_values = true)]
    pub source: Option<String>,

    /// Directory the reports are written to
    #[arg(long, short = 'o', env = "OUT_FOLDER", default_value = "out")]
    pub out: PathBuf,

    /// What to do with rows that cannot be parsed (skip or abort)
    #[arg(long, default_value = "skip")]
    pub on_malformed: MalformedPolicy,

    /// Only include usage from this month on (YYYY-MM)
    #[arg(long)]
    pub since: Option<String>,

    /// Only include usage up to this month (YYYY-MM)
    #[arg(long)]
    pub until: Option<String>,

    /// Keep a copy of the downloaded export under <out>/raw/
    #[arg(long)]
    pub keep_raw: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Show debug output
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,
}
