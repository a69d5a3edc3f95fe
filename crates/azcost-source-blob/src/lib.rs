//! Billing export source for azcost
//!
//! This crate implements the `BillingSource` trait for Azure Blob Storage
//! (SAS URLs) and local files, and parses the fetched CSV into records.

pub mod data_loader;
pub mod parser;

pub use data_loader::{BlobSource, DataLoader, LocalSource};
pub use parser::ExportReader;
