//! Shared constants: NcML vocabulary, defaults, and filename patterns.

/// XML namespace of every persisted aggregation document.
pub const NCML_NAMESPACE: &str = "http://www.unidata.ucar.edu/namespaces/netcdf/ncml-2.2";

/// Aggregation dimension used unless a loaded document says otherwise.
pub const DEFAULT_DIM_NAME: &str = "time";

/// Aggregation type used unless a loaded document says otherwise.
pub const DEFAULT_AGG_TYPE: &str = "joinExisting";

/// Coordinate count recorded for every product: one value per file along
/// the aggregation dimension.
pub const SINGLE_COORD: &str = "1";

/// Extension of candidate raster files, including the dot.
pub const RASTER_EXTENSION: &str = ".nc";

/// Tile code embedded in Sentinel-style file names: "T", two digits,
/// three uppercase letters (e.g. `T31UFT`).
pub const TILE_PATTERN: &str = r"T\d{2}[A-Z]{3}";

/// Acquisition date embedded in Sentinel-style file names: eight digits
/// immediately followed by "T" (e.g. `20210615T103021`).
pub const FILENAME_DATE_PATTERN: &str = r"(\d{8})T";
