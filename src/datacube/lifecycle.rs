//! Opening catalog handles.
//!
//! A handle opens against any path: an existing document is loaded, a
//! missing one leaves the handle unbacked until the first add bootstraps
//! the file. Attributes on a loaded document take precedence over the
//! constructor arguments, which only seed fresh documents.

use std::path::Path;

use crate::constants::{DEFAULT_AGG_TYPE, DEFAULT_DIM_NAME};
use crate::error::Result;
use crate::io::ncml;

use super::Datacube;

impl Datacube {
    /// Open a handle with the default dimension (`time`) and aggregation
    /// type (`joinExisting`).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, DEFAULT_DIM_NAME, DEFAULT_AGG_TYPE)
    }

    /// Open a handle, seeding fresh documents with the given attributes.
    pub fn open_with<P: AsRef<Path>>(path: P, dim_name: &str, agg_type: &str) -> Result<Self> {
        let path = path.as_ref();
        let doc = ncml::load(path)?;
        tracing::debug!(
            catalog.path = %path.display(),
            catalog.backed = doc.is_some(),
            "opened catalog handle"
        );
        Ok(Self {
            path: path.to_path_buf(),
            dim_name: dim_name.to_string(),
            agg_type: agg_type.to_string(),
            doc,
        })
    }
}
