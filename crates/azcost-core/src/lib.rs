//! Core types, traits, and errors for azcost
//!
//! This crate provides the billing record model, the report dimensions,
//! the error taxonomy, and the `BillingSource` trait shared by the
//! source crate and the `azcost` binary.

pub mod dimension;
pub mod error;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use dimension::{ReportDimension, UNASSIGNED_KEY, escape_key};
pub use error::{AzcostError, Result};
pub use source::{BillingSource, SourceLocation};
pub use types::{BillingMonth, BillingRecord, RawBillingRow};
