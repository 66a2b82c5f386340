//! Simulated fields as handed over by the simulation output reader.

use crate::fields::error::FieldError;
use crate::types::station::GridIndex;
use chrono::NaiveDateTime;
use ndarray::{s, ArrayD, Axis, Ix3};

/// A physical quantity on the simulation grid, indexed by (time, y, x) or
/// (time, level, y, x). Times are UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    name: String,
    units: String,
    times: Vec<NaiveDateTime>,
    values: ArrayD<f64>,
}

impl GriddedField {
    /// Creates a field, checking it is 3-D or 4-D and that its leading axis
    /// matches the time coordinate.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        times: Vec<NaiveDateTime>,
        values: ArrayD<f64>,
    ) -> Result<Self, FieldError> {
        let name = name.into();
        if !(3..=4).contains(&values.ndim()) {
            return Err(FieldError::Dimensionality {
                name,
                expected: "3 (time, y, x) or 4 (time, level, y, x)",
                found: values.ndim(),
            });
        }
        if values.shape()[0] != times.len() {
            return Err(FieldError::TimeMismatch {
                name,
                expected: times.len(),
                found: values.shape()[0],
            });
        }
        Ok(Self {
            name,
            units: units.into(),
            times,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// Horizontal grid size as (height, width), i.e. (south_north, west_east).
    pub fn grid_shape(&self) -> (usize, usize) {
        let shape = self.values.shape();
        (shape[shape.len() - 2], shape[shape.len() - 1])
    }

    /// Same field with new values on the same coordinates; used by unit
    /// conversions so the result keeps the field's identity.
    pub(crate) fn with_values(&self, units: impl Into<String>, values: ArrayD<f64>) -> Self {
        Self {
            name: self.name.clone(),
            units: units.into(),
            times: self.times.clone(),
            values,
        }
    }

    pub(crate) fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Lowest model level of a (time, level, y, x) field.
    pub fn surface(&self) -> Result<GriddedField, FieldError> {
        if self.values.ndim() != 4 {
            return Err(FieldError::Dimensionality {
                name: self.name.clone(),
                expected: "4 (time, level, y, x)",
                found: self.values.ndim(),
            });
        }
        let values = self.values.index_axis(Axis(1), 0).to_owned();
        Ok(self.with_values(self.units.clone(), values))
    }

    /// Time series of a single grid cell of a (time, y, x) field.
    pub fn series_at(&self, grid: GridIndex) -> Result<Vec<f64>, FieldError> {
        let view = self
            .values
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| FieldError::Dimensionality {
                name: self.name.clone(),
                expected: "3 (time, y, x)",
                found: self.values.ndim(),
            })?;
        let (_, height, width) = view.dim();
        if grid.x >= width || grid.y >= height {
            return Err(FieldError::OutOfGrid {
                name: self.name.clone(),
                x: grid.x,
                y: grid.y,
            });
        }
        Ok(view.slice(s![.., grid.y, grid.x]).to_vec())
    }
}

/// A field ready for colocation.
///
/// Scalars produce one table column named after the lower-cased field name.
/// Wind produces the `ws` and `wd` columns.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedField {
    Scalar(GriddedField),
    Wind {
        speed: GriddedField,
        direction: GriddedField,
    },
}

impl SimulatedField {
    pub const WIND_SPEED_COLUMN: &'static str = "ws";
    pub const WIND_DIRECTION_COLUMN: &'static str = "wd";

    pub fn times(&self) -> &[NaiveDateTime] {
        match self {
            SimulatedField::Scalar(field) => field.times(),
            SimulatedField::Wind { speed, .. } => speed.times(),
        }
    }

    pub fn grid_shape(&self) -> (usize, usize) {
        match self {
            SimulatedField::Scalar(field) => field.grid_shape(),
            SimulatedField::Wind { speed, .. } => speed.grid_shape(),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        match self {
            SimulatedField::Scalar(field) => vec![field.name().to_lowercase()],
            SimulatedField::Wind { .. } => vec![
                Self::WIND_SPEED_COLUMN.to_string(),
                Self::WIND_DIRECTION_COLUMN.to_string(),
            ],
        }
    }

    /// Named columns for one grid cell. Non-finite model values become missing.
    pub fn columns_at(&self, grid: GridIndex) -> Result<Vec<(String, Vec<Option<f64>>)>, FieldError> {
        let as_column = |values: Vec<f64>| {
            values
                .into_iter()
                .map(|v| v.is_finite().then_some(v))
                .collect::<Vec<_>>()
        };
        match self {
            SimulatedField::Scalar(field) => Ok(vec![(
                field.name().to_lowercase(),
                as_column(field.series_at(grid)?),
            )]),
            SimulatedField::Wind { speed, direction } => Ok(vec![
                (
                    Self::WIND_SPEED_COLUMN.to_string(),
                    as_column(speed.series_at(grid)?),
                ),
                (
                    Self::WIND_DIRECTION_COLUMN.to_string(),
                    as_column(direction.series_at(grid)?),
                ),
            ]),
        }
    }
}
