//! Core `Datacube` type: an exclusively-owned handle over one catalog path.

mod lifecycle;
mod mutation;

use std::path::{Path, PathBuf};

use crate::io::ncml::NcmlDocument;

/// Handle for one aggregation catalog.
///
/// Holds the catalog path and the in-memory mirror of the persisted
/// document. Every mutation flushes the full document back to disk before
/// returning, so the two never diverge on a successful call. The handle is
/// the single writer for its path; multi-process callers must serialize
/// access externally.
#[derive(Debug)]
pub struct Datacube {
    pub(crate) path: PathBuf,
    pub(crate) dim_name: String,
    pub(crate) agg_type: String,
    /// `None` until the on-disk document exists and carries an aggregation.
    pub(crate) doc: Option<NcmlDocument>,
}

/// Result of [`Datacube::add_product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The location was already recorded; nothing was written.
    AlreadyPresent,
}

/// Result of [`Datacube::remove_product`]. Absence is not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
    /// The catalog has no aggregation yet, so there is nothing to remove.
    NoAggregation,
}

/// Existence check over every recorded product location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Locations whose files no longer exist, in catalog order.
    pub missing: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

impl Datacube {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Effective aggregation dimension: the loaded document's when backed,
    /// otherwise the value the next bootstrap will write.
    #[must_use]
    pub fn dim_name(&self) -> &str {
        self.doc.as_ref().map_or(&self.dim_name, |d| &d.dim_name)
    }

    /// Effective aggregation type, same precedence as [`Self::dim_name`].
    #[must_use]
    pub fn agg_type(&self) -> &str {
        self.doc.as_ref().map_or(&self.agg_type, |d| &d.agg_type)
    }

    /// Ordered product locations; empty when no aggregation exists yet.
    #[must_use]
    pub fn list_products(&self) -> Vec<String> {
        self.doc.as_ref().map_or_else(Vec::new, |d| {
            d.products.iter().map(|p| p.location.clone()).collect()
        })
    }

    /// Exact string match against the recorded locations.
    #[must_use]
    pub fn has_product(&self, location: &str) -> bool {
        self.doc.as_ref().is_some_and(|d| {
            d.products.iter().any(|p| p.location == location)
        })
    }

    /// Re-check filesystem existence of every recorded location.
    ///
    /// The only operation that revisits existence after add-time. Reports
    /// drift without self-healing: missing entries stay in the catalog.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let missing: Vec<String> = self
            .doc
            .as_ref()
            .map_or_else(Vec::new, |d| {
                d.products
                    .iter()
                    .filter(|p| !Path::new(&p.location).exists())
                    .map(|p| p.location.clone())
                    .collect()
            });
        if missing.is_empty() {
            log::debug!("catalog validation passed");
        } else {
            tracing::warn!(
                catalog.path = %self.path.display(),
                catalog.missing = missing.len(),
                "catalog references raster files that no longer exist"
            );
        }
        ValidationReport { missing }
    }
}
