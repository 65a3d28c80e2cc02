//! Range-and-pattern scan: one shared catalog fed from a
//! `base/<platform>/<year>/<month>/<day>/` directory layout.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::constants::RASTER_EXTENSION;
use crate::datacube::{AddOutcome, Datacube};
use crate::error::{DatacubeError, Result};
use crate::types::{DateRange, ProcessingLevel, TileCode};

use super::{ReportSink, ScanOutcome, ScanSummary};

/// Inputs for one range scan. The [`DateRange`] is valid by construction,
/// so an inverted range never reaches the directory walk.
#[derive(Debug, Clone)]
pub struct RangeScanJob {
    pub base_path: PathBuf,
    /// Platform sub-directories under `base_path`, scanned in order.
    pub platforms: Vec<String>,
    pub range: DateRange,
    pub tile: TileCode,
    pub level: ProcessingLevel,
}

impl RangeScanJob {
    fn day_directory(&self, platform: &str, day: NaiveDate) -> PathBuf {
        self.base_path
            .join(platform)
            .join(day.year().to_string())
            .join(format!("{:02}", day.month()))
            .join(format!("{:02}", day.day()))
    }

    /// A name matches when it is a raster file carrying both the tile code
    /// and the level as substrings. Name-based only; content is never read.
    fn matches(&self, file_name: &str) -> bool {
        file_name.ends_with(RASTER_EXTENSION)
            && file_name.contains(self.tile.as_str())
            && file_name.contains(self.level.as_str())
    }
}

/// Scan every platform and day of the job into `cube`.
///
/// Missing day directories and non-matching entries are classified
/// outcomes, not errors. A file that vanishes before its add is reported
/// as [`ScanOutcome::AddFailed`] and the scan proceeds; store and I/O
/// failures abort.
pub fn scan_range(
    job: &RangeScanJob,
    cube: &mut Datacube,
    sink: &mut dyn ReportSink,
) -> Result<ScanSummary> {
    let mut summary = ScanSummary::default();
    tracing::info!(
        scan.base = %job.base_path.display(),
        scan.tile = %job.tile,
        scan.level = %job.level,
        scan.start = %job.range.start(),
        scan.end = %job.range.end(),
        "starting range scan"
    );

    for platform in &job.platforms {
        for day in job.range.days() {
            let directory = job.day_directory(platform, day);
            if !directory.is_dir() {
                emit(
                    sink,
                    &mut summary,
                    ScanOutcome::MissingDirectory {
                        directory: directory.clone(),
                    },
                )?;
                continue;
            }
            scan_day_directory(job, cube, sink, &mut summary, &directory)?;
        }
    }

    if summary.has_mismatches() {
        tracing::info!(
            scan.mismatches = summary.mismatches,
            "tile or level not found in some scanned directories; check the mismatch log for misspellings"
        );
    }
    tracing::info!(
        scan.added = summary.added,
        scan.missing_directories = summary.missing_directories,
        "range scan complete"
    );
    Ok(summary)
}

fn scan_day_directory(
    job: &RangeScanJob,
    cube: &mut Datacube,
    sink: &mut dyn ReportSink,
    summary: &mut ScanSummary,
    directory: &Path,
) -> Result<()> {
    // Fixed enumeration order regardless of platform readdir order.
    let mut names: Vec<String> = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort_unstable();

    for name in names {
        let path = directory.join(&name);
        if job.matches(&name) {
            let outcome = add_to_catalog(cube, &path)?;
            emit(sink, summary, outcome)?;
        } else {
            emit(
                sink,
                summary,
                ScanOutcome::TileOrLevelMismatch {
                    directory: directory.to_path_buf(),
                    file: path,
                },
            )?;
        }
    }
    Ok(())
}

pub(super) fn add_to_catalog(cube: &mut Datacube, path: &Path) -> Result<ScanOutcome> {
    let location = path.to_string_lossy().into_owned();
    match cube.add_product(&location) {
        Ok(AddOutcome::Added) => Ok(ScanOutcome::Added {
            product: path.to_path_buf(),
            catalog: cube.path().to_path_buf(),
        }),
        Ok(AddOutcome::AlreadyPresent) => Ok(ScanOutcome::AlreadyPresent {
            product: path.to_path_buf(),
            catalog: cube.path().to_path_buf(),
        }),
        Err(DatacubeError::ProductNotFound { path: missing }) => {
            tracing::warn!(
                product.location = %missing.display(),
                "candidate vanished before add; continuing scan"
            );
            Ok(ScanOutcome::AddFailed {
                product: path.to_path_buf(),
                reason: "file vanished before add".to_string(),
            })
        }
        Err(err) => Err(err),
    }
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn job(base: &Path, start: NaiveDate, end: NaiveDate) -> RangeScanJob {
        RangeScanJob {
            base_path: base.to_path_buf(),
            platforms: vec!["sentinel2a".to_string()],
            range: DateRange::new(start, end).expect("range"),
            tile: "T31UFT".parse().expect("tile"),
            level: ProcessingLevel::L2A,
        }
    }

    fn seed_day(base: &Path, day: &str, files: &[&str]) {
        let dir = base.join("sentinel2a").join(day);
        fs::create_dir_all(&dir).expect("day dir");
        for f in files {
            fs::write(dir.join(f), b"bytes").expect("seed file");
        }
    }

    #[test]
    fn single_day_range_scans_one_directory() {
        let data = TempDir::new().expect("data dir");
        let cubes = TempDir::new().expect("cube dir");
        seed_day(
            data.path(),
            "2021/06/15",
            &["S2A_MSIL2A_20210615T103021_T31UFT.nc"],
        );

        let mut cube = Datacube::open(cubes.path().join("cube.ncml")).expect("open");
        let mut sink = MemorySink::new();
        let job = job(data.path(), date(2021, 6, 15), date(2021, 6, 15));

        let summary = scan_range(&job, &mut cube, &mut sink).expect("scan");
        assert_eq!(summary.added, 1);
        assert_eq!(summary.missing_directories, 0);
        assert_eq!(cube.list_products().len(), 1);
    }

    #[test]
    fn absent_days_are_reported_not_fatal() {
        let data = TempDir::new().expect("data dir");
        let cubes = TempDir::new().expect("cube dir");
        seed_day(
            data.path(),
            "2021/06/16",
            &["S2A_MSIL2A_20210616T103021_T31UFT.nc"],
        );

        let mut cube = Datacube::open(cubes.path().join("cube.ncml")).expect("open");
        let mut sink = MemorySink::new();
        let job = job(data.path(), date(2021, 6, 15), date(2021, 6, 16));

        let summary = scan_range(&job, &mut cube, &mut sink).expect("scan");
        assert_eq!(summary.added, 1);
        assert_eq!(summary.missing_directories, 1);
        assert!(matches!(
            sink.outcomes[0],
            ScanOutcome::MissingDirectory { .. }
        ));
    }

    #[test]
    fn every_non_matching_entry_is_recorded() {
        let data = TempDir::new().expect("data dir");
        let cubes = TempDir::new().expect("cube dir");
        seed_day(
            data.path(),
            "2021/06/15",
            &[
                "S2A_MSIL2A_20210615T103021_T31UFT.nc",
                "S2A_MSIL1C_20210615T103021_T31UFT.nc",
                "readme.txt",
            ],
        );

        let mut cube = Datacube::open(cubes.path().join("cube.ncml")).expect("open");
        let mut sink = MemorySink::new();
        let job = job(data.path(), date(2021, 6, 15), date(2021, 6, 15));

        let summary = scan_range(&job, &mut cube, &mut sink).expect("scan");
        assert_eq!(summary.added, 1);
        assert_eq!(summary.mismatches, 2, "wrong level and unrelated file");
        assert!(summary.has_mismatches());
    }

    #[test]
    fn rescanning_reports_already_present() {
        let data = TempDir::new().expect("data dir");
        let cubes = TempDir::new().expect("cube dir");
        seed_day(
            data.path(),
            "2021/06/15",
            &["S2A_MSIL2A_20210615T103021_T31UFT.nc"],
        );

        let mut cube = Datacube::open(cubes.path().join("cube.ncml")).expect("open");
        let job = job(data.path(), date(2021, 6, 15), date(2021, 6, 15));

        let mut sink = MemorySink::new();
        scan_range(&job, &mut cube, &mut sink).expect("first scan");
        let summary = scan_range(&job, &mut cube, &mut sink).expect("second scan");

        assert_eq!(summary.added, 0);
        assert_eq!(summary.already_present, 1);
        assert_eq!(cube.list_products().len(), 1);
    }
}
