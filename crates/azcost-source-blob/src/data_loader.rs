//! Data loader for fetching and streaming billing exports
//!
//! This module fetches an export from Azure Blob Storage (or any HTTP URL,
//! or a local file) and provides streaming access to its records.
//!
//! # Credentials
//!
//! Blob access is authorised by the SAS token carried in the source URL.
//! The loader never logs the query string.
//!
//! # Examples
//!
//! ```no_run
//! use azcost_core::SourceLocation;
//! use azcost_source_blob::data_loader::DataLoader;
//! use futures::StreamExt;
//!
//! # async fn example() -> azcost_core::Result<()> {
//! let location = SourceLocation::parse("https://acct.blob.core.windows.net/exports/june.csv?sv=...")?;
//! let loader = DataLoader::new(location)?;
//!
//! let records = loader.load_records();
//! tokio::pin!(records);
//! while let Some(result) = records.next().await {
//!     let record = result?;
//!     println!("{:?}: {}", record.account_name, record.cost);
//! }
//! # Ok(())
//! # }
//! ```

use crate::parser::ExportReader;
use azcost_core::error::{AzcostError, Result};
use azcost_core::source::{BillingSource, SourceLocation};
use azcost_core::types::BillingRecord;
use async_trait::async_trait;
use futures::stream::Stream;
use reqwest::StatusCode;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Blob service REST version sent with every request
pub const BLOB_API_VERSION: &str = "2021-08-06";

/// Reads an export from Azure Blob Storage using a SAS URL
pub struct BlobSource {
    location: SourceLocation,
    url: String,
    client: reqwest::Client,
}

impl BlobSource {
    /// Create a source for a blob URL
    ///
    /// # Errors
    ///
    /// Returns [`AzcostError::InvalidSource`] when `location` is not a URL.
    pub fn new(location: SourceLocation) -> Result<Self> {
        Self::with_client(location, reqwest::Client::new())
    }

    /// Create a source that reuses an existing HTTP client
    pub fn with_client(location: SourceLocation, client: reqwest::Client) -> Result<Self> {
        let url = match &location {
            SourceLocation::Url(url) => url.clone(),
            SourceLocation::Local(path) => {
                return Err(AzcostError::InvalidSource(format!(
                    "{} is not a blob URL",
                    path.display()
                )));
            }
        };
        Ok(Self {
            location,
            url,
            client,
        })
    }
}

#[async_trait]
impl BillingSource for BlobSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        debug!("Requesting blob {}", self.location);
        let response = self
            .client
            .get(&self.url)
            .header("x-ms-version", BLOB_API_VERSION)
            .send()
            .await
            // reqwest includes the URL in its message, which would leak the SAS token
            .map_err(|e| AzcostError::Network(e.without_url()))?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AzcostError::PermissionDenied(self.location.redacted()));
            }
            s if !s.is_success() => {
                return Err(AzcostError::SourceUnavailable {
                    location: self.location.redacted(),
                    status: s.to_string(),
                });
            }
            _ => {}
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AzcostError::Network(e.without_url()))?;
        info!("Downloaded {} bytes from {}", bytes.len(), self.location);
        Ok(bytes.to_vec())
    }

    fn location(&self) -> &SourceLocation {
        &self.location
    }
}

/// Reads an export from the local filesystem
pub struct LocalSource {
    location: SourceLocation,
    path: PathBuf,
}

impl LocalSource {
    /// Create a source for a local file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            location: SourceLocation::Local(path.clone()),
            path,
        }
    }
}

#[async_trait]
impl BillingSource for LocalSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                info!("Read {} bytes from {}", bytes.len(), self.path.display());
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AzcostError::SourceUnavailable {
                location: self.location.redacted(),
                status: "file not found".to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(AzcostError::PermissionDenied(self.location.redacted()))
            }
            Err(e) => Err(AzcostError::Io(e)),
        }
    }

    fn location(&self) -> &SourceLocation {
        &self.location
    }
}

/// Data loader for one billing export
///
/// The DataLoader fetches the export through a [`BillingSource`] and turns it
/// into a stream of records.
pub struct DataLoader {
    source: Box<dyn BillingSource>,
    /// Where to keep a copy of the fetched bytes, if anywhere
    raw_copy: Option<PathBuf>,
}

impl DataLoader {
    /// Create a loader for a source location, picking the matching backend
    pub fn new(location: SourceLocation) -> Result<Self> {
        let source: Box<dyn BillingSource> = match &location {
            SourceLocation::Url(_) => Box::new(BlobSource::new(location.clone())?),
            SourceLocation::Local(path) => Box::new(LocalSource::new(path.clone())),
        };
        Ok(Self::from_source(source))
    }

    /// Create a loader around any billing source
    pub fn from_source(source: Box<dyn BillingSource>) -> Self {
        Self {
            source,
            raw_copy: None,
        }
    }

    /// Save the fetched export to `path` before parsing it
    pub fn with_raw_copy(mut self, path: Option<PathBuf>) -> Self {
        self.raw_copy = path;
        self
    }

    /// Location the loader reads from
    pub fn location(&self) -> &SourceLocation {
        self.source.location()
    }

    /// Stream the records of the export
    ///
    /// A failure to fetch or save the export, or a missing cost column, is
    /// yielded once and ends the stream. Malformed rows are yielded as
    /// [`AzcostError::MalformedRecord`] and iteration continues after them.
    pub fn load_records(&self) -> impl Stream<Item = Result<BillingRecord>> + '_ {
        async_stream::stream! {
            let bytes = match self.source.fetch().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            if let Some(path) = &self.raw_copy {
                if let Err(e) = save_raw_copy(path, &bytes).await {
                    yield Err(e);
                    return;
                }
            }

            let reader = match ExportReader::new(bytes) {
                Ok(reader) => reader,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for result in reader {
                yield result;
            }
        }
    }
}

async fn save_raw_copy(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    info!("Saved raw export to {}", path.display());
    Ok(())
}
