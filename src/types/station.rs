//! Defines the data structures representing air-quality monitoring stations:
//! catalog rows as read from disk and stations placed on the simulation grid.

use serde::{Deserialize, Serialize};
use std::fmt;

/// QualAr station identifier (e.g. `99` for Pinheiros).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationCode(pub u32);

impl StationCode {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents the geographical location of a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
}

/// Zero-based (x, y) index of a simulation grid cell, x along `west_east`
/// and y along `south_north`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub x: usize,
    pub y: usize,
}

/// One row of the station catalog, before it is placed on a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: StationCode,
    pub name: String,
    pub location: Location,
}

/// A monitoring station that falls inside the simulated domain.
///
/// Only built by the station locator, so `grid` is always strictly inside the
/// domain bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: StationCode,
    pub name: String,
    pub location: Location,
    pub grid: GridIndex,
}

impl Station {
    pub(crate) fn new(entry: &CatalogEntry, grid: GridIndex) -> Self {
        Self {
            code: entry.code,
            name: entry.name.clone(),
            location: entry.location,
            grid,
        }
    }
}
