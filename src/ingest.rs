//! Record ingestion with an explicit malformed-record policy
//!
//! The data loader yields every bad row as a recoverable error and leaves the
//! decision to the caller. [`collect_records`] applies a [`MalformedPolicy`]:
//! skip-and-warn (the default) or abort on the first bad row. Errors about the
//! source itself always abort.

use crate::error::{AzcostError, Result};
use crate::types::BillingRecord;
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// What to do with rows that cannot be turned into records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Log a warning, count the row, and keep going
    #[default]
    Skip,
    /// Stop the run at the first malformed row
    Abort,
}

impl fmt::Display for MalformedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl std::str::FromStr for MalformedPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            _ => Err(format!("Invalid malformed-record policy: {s} (expected skip or abort)")),
        }
    }
}

/// Records read from one export
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    /// Records that passed validation, in file order
    pub records: Vec<BillingRecord>,
    /// Number of malformed rows skipped
    pub skipped: usize,
}

/// Drain a record stream into memory, applying the malformed-record policy
///
/// # Errors
///
/// Returns the first non-recoverable error from the stream. Under
/// [`MalformedPolicy::Abort`] the first malformed row is reported as
/// [`AzcostError::MalformedAborted`].
pub async fn collect_records<S>(stream: S, policy: MalformedPolicy) -> Result<IngestOutcome>
where
    S: Stream<Item = Result<BillingRecord>>,
{
    let mut outcome = IngestOutcome::default();
    futures::pin_mut!(stream);

    while let Some(result) = stream.next().await {
        match result {
            Ok(record) => outcome.records.push(record),
            Err(e) if e.is_recoverable() => match policy {
                MalformedPolicy::Skip => {
                    warn!("Skipping {}", e);
                    outcome.skipped += 1;
                }
                MalformedPolicy::Abort => {
                    return Err(AzcostError::MalformedAborted {
                        first: e.to_string(),
                    });
                }
            },
            Err(e) => return Err(e),
        }
    }

    if outcome.skipped > 0 {
        warn!(
            "Skipped {} malformed record(s); {} record(s) kept",
            outcome.skipped,
            outcome.records.len()
        );
    } else {
        debug!("Ingested {} record(s)", outcome.records.len());
    }

    Ok(outcome)
}
