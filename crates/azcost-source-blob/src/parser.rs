//! CSV parsing for billing exports
//!
//! [`ExportReader`] walks the rows of an export one at a time, turning each
//! into a [`BillingRecord`] or a recoverable [`AzcostError::MalformedRecord`].
//! Problems with the file as a whole (no cost column, unreadable input) are
//! fatal and end iteration.

use azcost_core::error::{AzcostError, Result};
use azcost_core::types::{BillingRecord, COLUMN_ALIASES, COST_COLUMN, RawBillingRow};
use csv::{ReaderBuilder, StringRecord};
use std::io::Cursor;
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Lazy iterator over the records of one export file
pub struct ExportReader {
    reader: csv::Reader<Cursor<Vec<u8>>>,
    headers: StringRecord,
    row: StringRecord,
    done: bool,
}

impl ExportReader {
    /// Prepare to read an export held in memory
    ///
    /// The header row is read eagerly so a missing cost column fails here,
    /// before any record is produced. A zero-byte export yields no records.
    ///
    /// # Errors
    ///
    /// Returns [`AzcostError::MissingColumn`] when no spelling of the cost
    /// column is present, or a CSV error if the header row is unreadable.
    pub fn new(mut bytes: Vec<u8>) -> Result<Self> {
        if bytes.starts_with(UTF8_BOM) {
            bytes.drain(..UTF8_BOM.len());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(Cursor::new(bytes));
        let headers = canonical_headers(reader.headers()?);

        if headers.is_empty() {
            warn!("Billing export is empty");
            return Ok(Self {
                reader,
                headers,
                row: StringRecord::new(),
                done: true,
            });
        }

        if !headers.iter().any(|h| h == COST_COLUMN) {
            return Err(AzcostError::MissingColumn(COST_COLUMN.to_string()));
        }

        debug!("Billing export has {} columns", headers.len());
        Ok(Self {
            reader,
            headers,
            row: StringRecord::new(),
            done: false,
        })
    }

    /// Column names from the header row, with known columns renamed to their
    /// canonical spelling
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    fn next_record(&mut self) -> Option<Result<BillingRecord>> {
        match self.reader.read_record(&mut self.row) {
            Ok(false) => {
                self.done = true;
                None
            }
            Ok(true) => {
                let line = self.row.position().map(|p| p.line()).unwrap_or(0);
                let parsed = self
                    .row
                    .deserialize::<RawBillingRow>(Some(&self.headers))
                    .map_err(|e| AzcostError::MalformedRecord {
                        line,
                        reason: e.to_string(),
                    })
                    .and_then(|raw| BillingRecord::from_raw(raw, line));
                Some(parsed)
            }
            Err(e) => {
                if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                    self.done = true;
                    return Some(Err(AzcostError::Csv(e)));
                }
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                Some(Err(AzcostError::MalformedRecord {
                    line,
                    reason: e.to_string(),
                }))
            }
        }
    }
}

/// Rename recognised headers to the names [`RawBillingRow`] deserializes
///
/// For each canonical column only the first matching alias is renamed, so an
/// export carrying both `CostInBillingCurrency` and `Cost` keeps the former.
fn canonical_headers(headers: &StringRecord) -> StringRecord {
    let mut names: Vec<String> = headers.iter().map(str::to_string).collect();
    let mut claimed = vec![false; names.len()];

    for (canonical, aliases) in COLUMN_ALIASES {
        let found = aliases.iter().find_map(|alias| {
            (0..names.len()).find(|&idx| !claimed[idx] && names[idx].eq_ignore_ascii_case(alias))
        });
        if let Some(idx) = found {
            claimed[idx] = true;
            names[idx] = (*canonical).to_string();
        }
    }

    // Unclaimed headers that collide with a canonical name would be read as
    // duplicate fields, so they are renamed out of the way.
    for (idx, name) in names.iter_mut().enumerate() {
        if !claimed[idx] && COLUMN_ALIASES.iter().any(|(c, _)| name.as_str() == *c) {
            name.insert(0, '_');
        }
    }

    StringRecord::from(names)
}

impl Iterator for ExportReader {
    type Item = Result<BillingRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.next_record()
    }
}
