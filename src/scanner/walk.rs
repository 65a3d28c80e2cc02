//! Free-walk scan: partition an arbitrary tree of raster files into
//! per-(tile, year) catalogs.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use regex::Regex;
use walkdir::WalkDir;

use crate::constants::{FILENAME_DATE_PATTERN, RASTER_EXTENSION, TILE_PATTERN};
use crate::datacube::Datacube;
use crate::error::Result;

use super::range::add_to_catalog;
use super::{ReportSink, ScanOutcome, ScanSummary};

fn tile_regex() -> Option<&'static Regex> {
    static RE: OnceCell<Option<Regex>> = OnceCell::new();
    RE.get_or_init(|| Regex::new(TILE_PATTERN).ok()).as_ref()
}

fn date_regex() -> Option<&'static Regex> {
    static RE: OnceCell<Option<Regex>> = OnceCell::new();
    RE.get_or_init(|| Regex::new(FILENAME_DATE_PATTERN).ok())
        .as_ref()
}

/// Tile code embedded in a file name, e.g. `T31UFT`.
#[must_use]
pub fn extract_tile(file_name: &str) -> Option<&str> {
    tile_regex()?.find(file_name).map(|m| m.as_str())
}

/// Year of the eight-digit acquisition date embedded in a file name.
#[must_use]
pub fn extract_year(file_name: &str) -> Option<&str> {
    let captures = date_regex()?.captures(file_name)?;
    captures.get(1)?.as_str().get(..4)
}

/// Catalog path for one (tile, year) partition.
#[must_use]
pub fn partition_catalog_path(ncml_base: &Path, tile: &str, year: &str) -> PathBuf {
    ncml_base
        .join(tile)
        .join(year)
        .join(format!("dc_{year}_{tile}.ncml"))
}

/// Recursively ingest every raster file under `root`.
///
/// Each file's tile and year decide its partition; one exclusively-owned
/// [`Datacube`] handle per partition is kept for the whole run. Files whose
/// names miss either pattern are classified, never added.
pub fn scan_tree(
    root: &Path,
    ncml_base: &Path,
    sink: &mut dyn ReportSink,
) -> Result<ScanSummary> {
    let mut summary = ScanSummary::default();
    let mut partitions: BTreeMap<PathBuf, Datacube> = BTreeMap::new();
    tracing::info!(
        scan.root = %root.display(),
        scan.ncml_base = %ncml_base.display(),
        "starting tree scan"
    );

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(RASTER_EXTENSION) {
            continue;
        }

        let Some(tile) = extract_tile(&name) else {
            emit(
                sink,
                &mut summary,
                ScanOutcome::PatternMismatch {
                    file: entry.path().to_path_buf(),
                    reason: "no tile code in file name".to_string(),
                },
            )?;
            continue;
        };
        let Some(year) = extract_year(&name) else {
            emit(
                sink,
                &mut summary,
                ScanOutcome::PatternMismatch {
                    file: entry.path().to_path_buf(),
                    reason: "no acquisition date in file name".to_string(),
                },
            )?;
            continue;
        };

        let catalog_path = partition_catalog_path(ncml_base, tile, year);
        let cube = match partitions.entry(catalog_path) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let cube = Datacube::open(slot.key())?;
                slot.insert(cube)
            }
        };

        let outcome = add_to_catalog(cube, entry.path())?;
        emit(sink, &mut summary, outcome)?;
    }

    if summary.has_mismatches() {
        tracing::info!(
            scan.mismatches = summary.mismatches,
            "some raster files did not carry a recognizable tile or date"
        );
    }
    tracing::info!(
        scan.added = summary.added,
        scan.partitions = partitions.len(),
        "tree scan complete"
    );
    Ok(summary)
}

fn emit(
    sink: &mut dyn ReportSink,
    summary: &mut ScanSummary,
    outcome: ScanOutcome,
) -> Result<()> {
    summary.observe(&outcome);
    sink.record(&outcome)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::scanner::MemorySink;

    use super::*;

    #[test]
    fn extracts_tile_and_year_from_sentinel_name() {
        let name = "S2A_MSIL2A_20210615T103021_T31UFT.nc";
        assert_eq!(extract_tile(name), Some("T31UFT"));
        assert_eq!(extract_year(name), Some("2021"));
    }

    #[test]
    fn extraction_fails_without_embedded_date() {
        let name = "S2A_MSIL2A_T31UFT.nc";
        assert_eq!(extract_tile(name), Some("T31UFT"));
        assert_eq!(extract_year(name), None);
    }

    #[test]
    fn partition_path_follows_tile_and_year() {
        let path = partition_catalog_path(Path::new("/cubes"), "T31UFT", "2021");
        assert_eq!(
            path,
            Path::new("/cubes/T31UFT/2021/dc_2021_T31UFT.ncml")
        );
    }

    #[test]
    fn walk_partitions_by_tile_and_year() {
        let data = TempDir::new().expect("data dir");
        let cubes = TempDir::new().expect("cube dir");
        let nested = data.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("nested dirs");
        for name in [
            "S2A_MSIL2A_20210615T103021_T31UFT.nc",
            "S2A_MSIL2A_20220103T104559_T31UFT.nc",
        ] {
            fs::write(data.path().join("a").join(name), b"bytes").expect("seed");
        }
        fs::write(
            nested.join("S2B_MSIL1C_20210720T101559_T27XVH.nc"),
            b"bytes",
        )
        .expect("seed");

        let mut sink = MemorySink::new();
        let summary = scan_tree(data.path(), cubes.path(), &mut sink).expect("scan");

        assert_eq!(summary.added, 3);
        for (tile, year) in [("T31UFT", "2021"), ("T31UFT", "2022"), ("T27XVH", "2021")] {
            let catalog = partition_catalog_path(cubes.path(), tile, year);
            let cube = Datacube::open(&catalog).expect("open partition");
            assert_eq!(cube.list_products().len(), 1, "{tile}/{year}");
        }
    }

    #[test]
    fn pattern_misses_never_reach_a_catalog() {
        let data = TempDir::new().expect("data dir");
        let cubes = TempDir::new().expect("cube dir");
        fs::write(data.path().join("no_date_T31UFT.nc"), b"bytes").expect("seed");
        fs::write(data.path().join("20210615T_no_tile.nc"), b"bytes").expect("seed");
        fs::write(data.path().join("notes.txt"), b"bytes").expect("seed");

        let mut sink = MemorySink::new();
        let summary = scan_tree(data.path(), cubes.path(), &mut sink).expect("scan");

        assert_eq!(summary.added, 0);
        assert_eq!(summary.mismatches, 2, "non-raster files are skipped silently");
        assert!(
            fs::read_dir(cubes.path()).expect("cube dir").next().is_none(),
            "no catalog may be created"
        );
    }
}
