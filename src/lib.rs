#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are self-documenting; public APIs
// still carry proper docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// File names are compared the way the archive writes them.
#![allow(clippy::case_sensitive_file_extension_comparisons)]
#![allow(clippy::must_use_candidate)]

//! File-backed NcML aggregation catalogs for NetCDF raster collections.
//!
//! A catalog records which raster files form one virtual, time-aggregated
//! dataset, without copying or reading the files themselves. The persisted
//! form is a single pretty-printed NcML document; the in-memory mirror is
//! flushed back to disk after every mutation, so a crash between two
//! operations never leaves the document diverged from the last completed
//! one.
//!
//! Two ingestion strategies populate catalogs: a range scan over a
//! `platform/year/month/day` archive layout feeding one shared catalog,
//! and a free walk over an arbitrary tree feeding one catalog per
//! (tile, year) partition. Both classify every decision as a
//! [`ScanOutcome`] routed to a caller-supplied [`ReportSink`].

/// The datacube-core crate version (matches `Cargo.toml`).
pub const DATACUBE_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod constants;
pub mod datacube;
pub mod error;
pub mod io;
pub mod scanner;
pub mod types;

pub use config::ScanConfig;
pub use constants::{
    DEFAULT_AGG_TYPE, DEFAULT_DIM_NAME, NCML_NAMESPACE, RASTER_EXTENSION, SINGLE_COORD,
};
pub use datacube::{AddOutcome, Datacube, RemoveOutcome, ValidationReport};
pub use error::{DatacubeError, Result};
pub use io::ncml::NcmlDocument;
pub use scanner::{
    LogFileSink, MemorySink, RangeScanJob, ReportSink, ScanOutcome, ScanSummary, scan_range,
    scan_tree,
};
pub use types::{DateRange, Days, ProcessingLevel, Product, TileCode};
