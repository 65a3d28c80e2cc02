//! Public types shared by the catalog engine and the ingestion scanners.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::SINGLE_COORD;
use crate::error::{DatacubeError, Result};

/// One file reference recorded inside a catalog.
///
/// `ncoords` is the number of coordinate values the file contributes along
/// the aggregation dimension; every product written by this crate carries
/// [`SINGLE_COORD`], but values read from existing documents are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub location: String,
    pub ncoords: String,
}

impl Product {
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ncoords: SINGLE_COORD.to_string(),
        }
    }
}

/// Inclusive calendar range, `start <= end` enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting inverted bounds before any I/O happens.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DatacubeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Iterate every calendar day in the range, both bounds included.
    #[must_use]
    pub fn days(&self) -> Days {
        Days {
            next: Some(self.start),
            end: self.end,
        }
    }
}

/// Iterator over the days of a [`DateRange`].
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current < self.end {
            current.succ_opt()
        } else {
            None
        };
        Some(current)
    }
}

/// Spatial grid cell identifier: "T" followed by five alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TileCode(String);

impl TileCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TileCode {
    type Err = DatacubeError;

    fn from_str(value: &str) -> Result<Self> {
        let mut chars = value.chars();
        let well_formed = value.len() == 6
            && chars.next() == Some('T')
            && chars.all(|c| c.is_ascii_alphanumeric());
        if well_formed {
            Ok(Self(value.to_string()))
        } else {
            Err(DatacubeError::Validation {
                field: "tile",
                reason: format!(
                    "{value:?} must be 'T' followed by five letters or digits (e.g. T27XVH)"
                ),
            })
        }
    }
}

impl TryFrom<String> for TileCode {
    type Error = DatacubeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TileCode> for String {
    fn from(tile: TileCode) -> String {
        tile.0
    }
}

impl fmt::Display for TileCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Processing level of a raster product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingLevel {
    L1B,
    L1C,
    L2A,
}

impl ProcessingLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L1B => "L1B",
            Self::L1C => "L1C",
            Self::L2A => "L2A",
        }
    }
}

impl FromStr for ProcessingLevel {
    type Err = DatacubeError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "L1B" => Ok(Self::L1B),
            "L1C" => Ok(Self::L1C),
            "L2A" => Ok(Self::L2A),
            other => Err(DatacubeError::Validation {
                field: "level",
                reason: format!("{other:?} is not one of L1B, L1C, L2A"),
            }),
        }
    }
}

impl fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
