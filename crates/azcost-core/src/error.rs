//! Error types for azcost
//!
//! This module defines the error types used throughout the azcost crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! Errors fall into three groups that mirror the pipeline stages:
//!
//! - **Ingestion**: the source could not be reached or read, or a row of the
//!   export is malformed. Only [`AzcostError::MalformedRecord`] is recoverable.
//! - **Aggregation**: a record reached aggregation without any dimension value.
//! - **Emission**: a report file could not be written.
//!
//! # Example
//!
//! ```
//! use azcost_core::error::{AzcostError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to AzcostError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for azcost operations
#[derive(Error, Debug)]
pub enum AzcostError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Network error talking to the storage endpoint
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The source location string could not be understood
    #[error("Invalid source location: {0}")]
    InvalidSource(String),

    /// The storage endpoint answered, but not with the export
    #[error("Source unavailable: {location} returned {status}")]
    SourceUnavailable {
        /// Location that was requested (query string stripped)
        location: String,
        /// HTTP status or short reason
        status: String,
    },

    /// The storage endpoint rejected the credentials carried by the source
    #[error("Permission denied reading {0}; check the SAS token")]
    PermissionDenied(String),

    /// A column the reports depend on is absent from the export header
    #[error("Billing export is missing required column '{0}'")]
    MissingColumn(String),

    /// A single row of the export could not be turned into a record
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number in the export
        line: u64,
        /// What was wrong with the row
        reason: String,
    },

    /// The abort policy stopped the run at the first malformed row
    #[error("Aborting on malformed record: {first}")]
    MalformedAborted {
        /// Description of the malformed row
        first: String,
    },

    /// A record reached aggregation in a state ingestion should have rejected
    #[error("Aggregation error: {0}")]
    Aggregation(String),

    /// A report file could not be written
    #[error("Failed to write report {path}: {source}")]
    Emission {
        /// Target report path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// One or more reports failed to emit after all were attempted
    #[error("{failed} report(s) failed to write")]
    ReportsFailed {
        /// Number of reports that failed
        failed: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AzcostError {
    /// Whether the run can continue past this error.
    ///
    /// Only a malformed individual row is recoverable; every other error is
    /// about the source, the configuration, or the output as a whole.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AzcostError::MalformedRecord { .. })
    }
}

/// Convenience type alias for Results in azcost
///
/// # Example
///
/// ```
/// use azcost_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, AzcostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AzcostError::MissingColumn("CostInBillingCurrency".to_string());
        assert_eq!(
            error.to_string(),
            "Billing export is missing required column 'CostInBillingCurrency'"
        );

        let error = AzcostError::MalformedRecord {
            line: 7,
            reason: "missing cost".to_string(),
        };
        assert_eq!(error.to_string(), "Malformed record at line 7: missing cost");

        let error = AzcostError::MalformedAborted {
            first: error.to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Aborting on malformed record: Malformed record at line 7: missing cost"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let azcost_error: AzcostError = io_error.into();
        assert!(matches!(azcost_error, AzcostError::Io(_)));
    }

    #[test]
    fn test_only_malformed_records_are_recoverable() {
        assert!(
            AzcostError::MalformedRecord {
                line: 2,
                reason: "bad".into()
            }
            .is_recoverable()
        );
        assert!(!AzcostError::MissingColumn("Date".into()).is_recoverable());
        assert!(!AzcostError::Aggregation("x".into()).is_recoverable());
        assert!(!AzcostError::ReportsFailed { failed: 1 }.is_recoverable());
    }
}
