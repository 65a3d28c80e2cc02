//! Error taxonomy for catalog maintenance and ingestion scans.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DatacubeError>;

/// Errors surfaced by the catalog engine and the ingestion scanners.
///
/// Structural errors (`Config`, `InvalidRange`, `InvalidDocument`, `Io`)
/// abort a run; `ProductNotFound` is scoped to the single file being added
/// and scan loops are expected to catch it per file.
#[derive(Debug, Error)]
pub enum DatacubeError {
    /// A caller-supplied input failed validation before any I/O.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A required configuration key is absent.
    #[error("missing required configuration key: {key}")]
    Config { key: String },

    /// The scan range is inverted.
    #[error("start date {start} must not be after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// `add_product` was called with a path that is not an existing file.
    #[error("raster file not found: {}", .path.display())]
    ProductNotFound { path: PathBuf },

    /// The on-disk NcML document could not be parsed or written.
    #[error("invalid ncml document {}: {reason}", .path.display())]
    InvalidDocument { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
