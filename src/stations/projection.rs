//! Geographic coordinates to simulation grid indices.

use bon::bon;

const EARTH_RADIUS_M: f64 = 6_370_000.0;

/// Maps a latitude/longitude to the 0-based (x, y) index of the nearest grid
/// cell. The index may fall outside the grid.
pub trait GridProjection {
    fn ll_to_xy(&self, latitude: f64, longitude: f64) -> (i64, i64);
}

/// Lambert conformal conic grid as used by WRF (`MAP_PROJ = 1`).
///
/// The reference point is the centre of grid cell (0, 0), i.e. `XLAT[0, 0]`
/// and `XLONG[0, 0]` of the mass grid.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformal {
    stand_lon: f64,
    truelat1: f64,
    hemi: f64,
    cone: f64,
    rebydx: f64,
    polei: f64,
    polej: f64,
}

fn wrap_longitude(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

#[bon]
impl LambertConformal {
    #[builder]
    pub fn new(
        truelat1: f64,
        truelat2: f64,
        stand_lon: f64,
        ref_lat: f64,
        ref_lon: f64,
        // grid spacing, metres
        dx: f64,
    ) -> Self {
        let hemi = if truelat1 < 0.0 { -1.0 } else { 1.0 };
        let cone = if (truelat1 - truelat2).abs() > 0.1 {
            (truelat1.to_radians().cos().log10() - truelat2.to_radians().cos().log10())
                / ((45.0 - truelat1.abs() / 2.0).to_radians().tan().log10()
                    - (45.0 - truelat2.abs() / 2.0).to_radians().tan().log10())
        } else {
            truelat1.abs().to_radians().sin()
        };

        let mut projection = Self {
            stand_lon,
            truelat1,
            hemi,
            cone,
            rebydx: EARTH_RADIUS_M / dx,
            polei: 0.0,
            polej: 0.0,
        };
        // Pole position such that the reference point lands on (1, 1).
        let rsw = projection.radius(ref_lat);
        let arg = projection.angle(ref_lon);
        projection.polei = hemi - hemi * rsw * arg.sin();
        projection.polej = hemi + rsw * arg.cos();
        projection
    }

    /// Distance from the pole in grid units.
    fn radius(&self, latitude: f64) -> f64 {
        let ctl1r = self.truelat1.to_radians().cos();
        let ratio = ((90.0 * self.hemi - latitude).to_radians() / 2.0).tan()
            / ((90.0 * self.hemi - self.truelat1).to_radians() / 2.0).tan();
        self.rebydx * ctl1r / self.cone * ratio.powf(self.cone)
    }

    fn angle(&self, longitude: f64) -> f64 {
        self.cone * wrap_longitude(longitude - self.stand_lon).to_radians()
    }

    /// Fractional 1-based (i, j) grid position.
    pub fn ll_to_ij(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        let rm = self.radius(latitude);
        let arg = self.angle(longitude);
        let i = self.polei + self.hemi * rm * arg.sin();
        let j = self.polej - rm * arg.cos();
        (self.hemi * i, self.hemi * j)
    }
}

impl GridProjection for LambertConformal {
    fn ll_to_xy(&self, latitude: f64, longitude: f64) -> (i64, i64) {
        let (i, j) = self.ll_to_ij(latitude, longitude);
        (i.round() as i64 - 1, j.round() as i64 - 1)
    }
}

/// Regular latitude/longitude grid with cell (0, 0) centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularLatLon {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dlat: f64,
    pub dlon: f64,
}

impl GridProjection for RegularLatLon {
    fn ll_to_xy(&self, latitude: f64, longitude: f64) -> (i64, i64) {
        let x = ((longitude - self.origin_lon) / self.dlon).round() as i64;
        let y = ((latitude - self.origin_lat) / self.dlat).round() as i64;
        (x, y)
    }
}
