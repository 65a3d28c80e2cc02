//! Run configuration for ingestion scans.
//!
//! A TOML mapping supplies the base data path, the catalog path, and the
//! platform sub-directories to scan:
//!
//! ```toml
//! [paths]
//! base_path = "/archive/netcdf"
//! ncml_path = "/catalogs/ondemand.ncml"
//! log_path = "/var/log/datacube"
//!
//! [platforms]
//! s2a = "sentinel2a"
//! s2b = "sentinel2b"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DatacubeError, Result};

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    paths: Option<RawPaths>,
    platforms: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPaths {
    base_path: Option<PathBuf>,
    ncml_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
}

/// Validated scan configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Root of the `platform/year/month/day` data layout.
    pub base_path: PathBuf,
    /// Path of the shared catalog a range scan writes to.
    pub ncml_path: PathBuf,
    /// Directory for scan logs; the current directory when unset.
    pub log_path: Option<PathBuf>,
    /// Named platform sub-directories, scanned in key order.
    pub platforms: BTreeMap<String, String>,
}

impl ScanConfig {
    /// Load and validate the configuration at `path`.
    ///
    /// Both required path keys must be present; a missing one fails with
    /// [`DatacubeError::Config`] before any scanning starts.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&text).map_err(|err| DatacubeError::Validation {
            field: "config",
            reason: err.to_string(),
        })?;

        let paths = raw.paths.ok_or_else(|| missing("paths"))?;
        let config = Self {
            base_path: paths.base_path.ok_or_else(|| missing("paths.base_path"))?,
            ncml_path: paths.ncml_path.ok_or_else(|| missing("paths.ncml_path"))?,
            log_path: paths.log_path,
            platforms: raw.platforms.unwrap_or_default(),
        };
        tracing::debug!(
            config.base_path = %config.base_path.display(),
            config.ncml_path = %config.ncml_path.display(),
            config.platforms = config.platforms.len(),
            "configuration is valid"
        );
        Ok(config)
    }

    /// Platform directory names in deterministic (key) order.
    #[must_use]
    pub fn platform_dirs(&self) -> Vec<String> {
        self.platforms.values().cloned().collect()
    }
}

fn missing(key: &str) -> DatacubeError {
    DatacubeError::Config {
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, text).expect("write config");
        path
    }

    #[test]
    fn full_config_parses() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(
            &dir,
            r#"
[paths]
base_path = "/archive/netcdf"
ncml_path = "/catalogs/ondemand.ncml"
log_path = "/var/log/datacube"

[platforms]
s2a = "sentinel2a"
s2b = "sentinel2b"
"#,
        );

        let config = ScanConfig::load(&path).expect("load");
        assert_eq!(config.base_path, PathBuf::from("/archive/netcdf"));
        assert_eq!(
            config.platform_dirs(),
            vec!["sentinel2a".to_string(), "sentinel2b".to_string()]
        );
    }

    #[test]
    fn platforms_are_optional() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(
            &dir,
            "[paths]\nbase_path = \"/a\"\nncml_path = \"/b.ncml\"\n",
        );

        let config = ScanConfig::load(&path).expect("load");
        assert!(config.platforms.is_empty());
        assert!(config.log_path.is_none());
    }

    #[test]
    fn missing_required_key_is_a_config_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(&dir, "[paths]\nbase_path = \"/a\"\n");

        let err = ScanConfig::load(&path).expect_err("must fail");
        match err {
            DatacubeError::Config { key } => assert_eq!(key, "paths.ncml_path"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_paths_table_is_a_config_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(&dir, "[platforms]\ns2a = \"sentinel2a\"\n");

        let err = ScanConfig::load(&path).expect_err("must fail");
        match err {
            DatacubeError::Config { key } => assert_eq!(key, "paths"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
