use crate::stations::catalog::read_catalog;
use crate::stations::error::StationError;
use crate::stations::projection::GridProjection;
use crate::types::station::{CatalogEntry, GridIndex, Station};
use log::{debug, info};
use std::path::Path;

/// Places catalog stations on a simulation grid.
#[derive(Debug, Clone)]
pub struct StationLocator {
    catalog: Vec<CatalogEntry>,
}

impl StationLocator {
    pub fn new(catalog: Vec<CatalogEntry>) -> Self {
        Self { catalog }
    }

    pub fn from_catalog_file(path: &Path) -> Result<Self, StationError> {
        let catalog = read_catalog(path)?;
        info!(
            "Loaded {} stations from catalog {}",
            catalog.len(),
            path.display()
        );
        Ok(Self { catalog })
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Stations whose grid cell lies strictly inside a grid of
    /// `(height, width)` cells, in catalog order.
    ///
    /// Cells on the first row or column are excluded together with anything
    /// outside the grid.
    pub fn stations_in_domain<P: GridProjection + ?Sized>(
        &self,
        projection: &P,
        grid_shape: (usize, usize),
    ) -> Vec<Station> {
        let (height, width) = grid_shape;
        let stations: Vec<Station> = self
            .catalog
            .iter()
            .filter_map(|entry| {
                let (x, y) =
                    projection.ll_to_xy(entry.location.latitude, entry.location.longitude);
                let inside = x > 0 && (x as usize) < width && y > 0 && (y as usize) < height;
                if inside {
                    Some(Station::new(
                        entry,
                        GridIndex {
                            x: x as usize,
                            y: y as usize,
                        },
                    ))
                } else {
                    debug!(
                        "Station {} ({}) at grid ({}, {}) is outside the {}x{} domain",
                        entry.code, entry.name, x, y, width, height
                    );
                    None
                }
            })
            .collect();
        info!(
            "{} of {} stations fall inside the simulation domain",
            stations.len(),
            self.catalog.len()
        );
        stations
    }
}
