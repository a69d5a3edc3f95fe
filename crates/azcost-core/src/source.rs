//! Billing source trait and source locations
//!
//! A billing source hands back the raw bytes of one export file. Parsing the
//! bytes into records is the data loader's job, so every storage backend only
//! has to implement [`BillingSource::fetch`].

use crate::error::{AzcostError, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// Where a billing export lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Blob (or any HTTP) URL, usually carrying a SAS token in the query
    Url(String),
    /// File on the local filesystem
    Local(PathBuf),
}

impl SourceLocation {
    /// Classify a `--source` argument
    ///
    /// `http://` and `https://` are blob URLs, `file://` and anything else a
    /// local path.
    ///
    /// ```
    /// use azcost_core::source::SourceLocation;
    /// use std::path::PathBuf;
    ///
    /// let blob = SourceLocation::parse("https://acct.blob.core.windows.net/c/b.csv?sv=1").unwrap();
    /// assert!(matches!(blob, SourceLocation::Url(_)));
    ///
    /// let local = SourceLocation::parse("file:///tmp/export.csv").unwrap();
    /// assert_eq!(local, SourceLocation::Local(PathBuf::from("/tmp/export.csv")));
    /// ```
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(AzcostError::InvalidSource(
                "source is empty; pass --source or set STORAGE_URL".to_string(),
            ));
        }

        let lower = location.to_ascii_lowercase();
        if lower.starts_with("https://") || lower.starts_with("http://") {
            return Ok(SourceLocation::Url(location.to_string()));
        }
        if let Some(path) = location.strip_prefix("file://") {
            if path.is_empty() {
                return Err(AzcostError::InvalidSource(location.to_string()));
            }
            return Ok(SourceLocation::Local(PathBuf::from(path)));
        }
        if lower.contains("://") {
            return Err(AzcostError::InvalidSource(format!(
                "unsupported scheme in '{location}'"
            )));
        }

        Ok(SourceLocation::Local(PathBuf::from(location)))
    }

    /// Printable form with any query string removed, so SAS tokens never
    /// reach logs
    pub fn redacted(&self) -> String {
        match self {
            SourceLocation::Url(url) => redact_url(url),
            SourceLocation::Local(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Strip the query string (and fragment) from a URL
pub fn redact_url(url: &str) -> String {
    match url.find(['?', '#']) {
        Some(idx) => url[..idx].to_string(),
        None => url.to_string(),
    }
}

/// Storage backend that can produce the bytes of one billing export
#[async_trait]
pub trait BillingSource: Send + Sync {
    /// Fetch the whole export
    ///
    /// # Errors
    ///
    /// Fails when the source is unreachable, missing, or refuses access.
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Location being read, for logging
    fn location(&self) -> &SourceLocation;
}
