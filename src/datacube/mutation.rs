//! Catalog mutations: add, remove, clear.
//!
//! Every mutating call persists the whole document before returning, so a
//! crash between two operations leaves the file consistent with the last
//! completed one.

use std::path::Path;

use crate::error::{DatacubeError, Result};
use crate::io::ncml::{self, NcmlDocument};
use crate::types::Product;

use super::{AddOutcome, Datacube, RemoveOutcome};

impl Datacube {
    /// Record `location` in the catalog.
    ///
    /// Fails with [`DatacubeError::ProductNotFound`] when `location` is not
    /// an existing file; the catalog is untouched in that case. Adding a
    /// location that is already recorded is a no-op reported as
    /// [`AddOutcome::AlreadyPresent`].
    pub fn add_product(&mut self, location: &str) -> Result<AddOutcome> {
        let source = Path::new(location);
        if !source.is_file() {
            return Err(DatacubeError::ProductNotFound {
                path: source.to_path_buf(),
            });
        }

        let doc = match &mut self.doc {
            Some(doc) => doc,
            doc @ None => {
                let fresh = NcmlDocument::new(self.dim_name.clone(), self.agg_type.clone());
                ncml::save(&self.path, &fresh)?;
                tracing::info!(
                    catalog.path = %self.path.display(),
                    "bootstrapped aggregation document"
                );
                doc.insert(fresh)
            }
        };

        if doc.products.iter().any(|p| p.location == location) {
            tracing::debug!(
                catalog.path = %self.path.display(),
                product.location = location,
                "product already present"
            );
            return Ok(AddOutcome::AlreadyPresent);
        }

        doc.products.push(Product::new(location));
        ncml::save(&self.path, doc)?;
        tracing::info!(
            catalog.path = %self.path.display(),
            product.location = location,
            "added product"
        );
        Ok(AddOutcome::Added)
    }

    /// Drop the entry matching `location`, if any. Absence of the entry or
    /// of the whole aggregation is reported, not an error.
    pub fn remove_product(&mut self, location: &str) -> Result<RemoveOutcome> {
        let Some(doc) = self.doc.as_mut() else {
            tracing::debug!(
                catalog.path = %self.path.display(),
                "no aggregation, nothing to remove"
            );
            return Ok(RemoveOutcome::NoAggregation);
        };

        let Some(index) = doc.products.iter().position(|p| p.location == location) else {
            tracing::debug!(
                catalog.path = %self.path.display(),
                product.location = location,
                "product not found"
            );
            return Ok(RemoveOutcome::NotFound);
        };

        doc.products.remove(index);
        ncml::save(&self.path, doc)?;
        tracing::info!(
            catalog.path = %self.path.display(),
            product.location = location,
            "removed product"
        );
        Ok(RemoveOutcome::Removed)
    }

    /// Remove every product and persist the emptied aggregation. No-op
    /// when there is no aggregation.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(doc) = self.doc.as_mut() {
            doc.products.clear();
            ncml::save(&self.path, doc)?;
            tracing::info!(catalog.path = %self.path.display(), "cleared catalog");
        }
        Ok(())
    }
}
