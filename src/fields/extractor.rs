//! Pulls named fields out of a simulation output and turns them into the
//! descriptors the colocator understands.

use crate::fields::error::FieldError;
use crate::types::gridded_field::{GriddedField, SimulatedField};
use chrono::NaiveDateTime;
use ndarray::Zip;
use std::collections::HashMap;

/// Read-only access to a finished simulation run.
///
/// Implementations return every time step of a field. Readers for concrete
/// file formats live outside this crate.
pub trait FieldProvider {
    /// UTC time of each simulation step.
    fn times(&self) -> &[NaiveDateTime];

    fn field(&self, name: &str) -> Result<GriddedField, FieldError>;
}

/// Provider over fields already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFieldProvider {
    times: Vec<NaiveDateTime>,
    fields: HashMap<String, GriddedField>,
}

impl MemoryFieldProvider {
    pub fn new(times: Vec<NaiveDateTime>) -> Self {
        Self {
            times,
            fields: HashMap::new(),
        }
    }

    /// Adds a field under its own name. The field must cover every time step.
    pub fn insert(&mut self, field: GriddedField) -> Result<(), FieldError> {
        if field.times() != self.times.as_slice() {
            return Err(FieldError::TimeMismatch {
                name: field.name().to_string(),
                expected: self.times.len(),
                found: field.times().len(),
            });
        }
        self.fields.insert(field.name().to_string(), field);
        Ok(())
    }
}

impl FieldProvider for MemoryFieldProvider {
    fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    fn field(&self, name: &str) -> Result<GriddedField, FieldError> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| FieldError::MissingField(name.to_string()))
    }
}

/// What to extract and how to present it to the colocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// A single quantity. 4-D fields are reduced to their lowest level.
    Scalar(String),
    /// Wind already split into speed and direction fields.
    WindVector { speed: String, direction: String },
    /// Earth-relative wind components (eastward `u`, northward `v`, as in
    /// `uvmet10`), converted to speed and meteorological direction.
    WindComponents { u: String, v: String },
    /// Grid-relative components (`U10`, `V10`) rotated to earth-relative with
    /// the grid's `COSALPHA` and `SINALPHA` fields before conversion.
    GridWindComponents {
        u: String,
        v: String,
        cosalpha: String,
        sinalpha: String,
    },
}

impl FieldSpec {
    pub fn scalar(name: impl Into<String>) -> Self {
        FieldSpec::Scalar(name.into())
    }

    pub fn extract<P: FieldProvider + ?Sized>(
        &self,
        provider: &P,
    ) -> Result<SimulatedField, FieldError> {
        match self {
            FieldSpec::Scalar(name) => Ok(SimulatedField::Scalar(surface_of(provider.field(name)?)?)),
            FieldSpec::WindVector { speed, direction } => Ok(SimulatedField::Wind {
                speed: surface_of(provider.field(speed)?)?,
                direction: surface_of(provider.field(direction)?)?,
            }),
            FieldSpec::WindComponents { u, v } => {
                let u = surface_of(provider.field(u)?)?;
                let v = surface_of(provider.field(v)?)?;
                let (speed, direction) = wind_from_components(&u, &v)?;
                Ok(SimulatedField::Wind { speed, direction })
            }
            FieldSpec::GridWindComponents {
                u,
                v,
                cosalpha,
                sinalpha,
            } => {
                let (u, v) = earth_relative(
                    &surface_of(provider.field(u)?)?,
                    &surface_of(provider.field(v)?)?,
                    &provider.field(cosalpha)?,
                    &provider.field(sinalpha)?,
                )?;
                let (speed, direction) = wind_from_components(&u, &v)?;
                Ok(SimulatedField::Wind { speed, direction })
            }
        }
    }
}

/// Extracts every requested field.
pub fn extract_fields<P: FieldProvider + ?Sized>(
    provider: &P,
    specs: &[FieldSpec],
) -> Result<Vec<SimulatedField>, FieldError> {
    if specs.is_empty() {
        return Err(FieldError::NoFields);
    }
    specs.iter().map(|spec| spec.extract(provider)).collect()
}

fn surface_of(field: GriddedField) -> Result<GriddedField, FieldError> {
    if field.values().ndim() == 4 {
        field.surface()
    } else {
        Ok(field)
    }
}

fn check_shape(reference: &GriddedField, other: &GriddedField) -> Result<(), FieldError> {
    if reference.shape() != other.shape() {
        return Err(FieldError::ShapeMismatch {
            name: other.name().to_string(),
            expected: reference.shape().to_vec(),
            found: other.shape().to_vec(),
        });
    }
    Ok(())
}

/// Rotates grid-relative components to earth-relative ones:
/// `u_e = u cosα - v sinα`, `v_e = v cosα + u sinα`.
pub fn earth_relative(
    u: &GriddedField,
    v: &GriddedField,
    cosalpha: &GriddedField,
    sinalpha: &GriddedField,
) -> Result<(GriddedField, GriddedField), FieldError> {
    check_shape(u, v)?;
    check_shape(u, cosalpha)?;
    check_shape(u, sinalpha)?;
    let east = Zip::from(u.values())
        .and(v.values())
        .and(cosalpha.values())
        .and(sinalpha.values())
        .map_collect(|u, v, c, s| u * c - v * s);
    let north = Zip::from(u.values())
        .and(v.values())
        .and(cosalpha.values())
        .and(sinalpha.values())
        .map_collect(|u, v, c, s| v * c + u * s);
    Ok((
        u.with_values(u.units().to_string(), east),
        v.with_values(v.units().to_string(), north),
    ))
}

/// Wind speed and the direction the wind blows from, in degrees clockwise
/// from north. `u` and `v` must be earth-relative.
pub fn wind_from_components(
    u: &GriddedField,
    v: &GriddedField,
) -> Result<(GriddedField, GriddedField), FieldError> {
    check_shape(u, v)?;
    let speed = Zip::from(u.values())
        .and(v.values())
        .map_collect(|u, v| u.hypot(*v));
    let direction = Zip::from(u.values())
        .and(v.values())
        .map_collect(|u, v| (270.0 - v.atan2(*u).to_degrees()).rem_euclid(360.0));
    Ok((
        u.with_values("m s-1", speed).renamed("ws"),
        u.with_values("degrees", direction).renamed("wd"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::GridIndex;
    use chrono::NaiveDate;
    use ndarray::{Array3, Array4};

    fn times() -> Vec<NaiveDateTime> {
        vec![NaiveDate::from_ymd_opt(2018, 6, 21)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()]
    }

    fn provider() -> MemoryFieldProvider {
        let mut provider = MemoryFieldProvider::new(times());
        let t2 = Array3::from_elem((1, 2, 2), 295.0).into_dyn();
        let o3 = Array4::from_shape_fn((1, 3, 2, 2), |(_, k, _, _)| 0.04 + k as f64).into_dyn();
        let u = Array3::from_elem((1, 2, 2), 0.0).into_dyn();
        let v = Array3::from_elem((1, 2, 2), -3.0).into_dyn();
        for (name, units, values) in [
            ("T2", "K", t2),
            ("o3", "ppmv", o3),
            ("U10", "m s-1", u),
            ("V10", "m s-1", v),
            ("COSALPHA", "", Array3::from_elem((1, 2, 2), 0.0).into_dyn()),
            ("SINALPHA", "", Array3::from_elem((1, 2, 2), 1.0).into_dyn()),
        ] {
            provider
                .insert(GriddedField::new(name, units, times(), values).unwrap())
                .unwrap();
        }
        provider
    }

    #[test]
    fn test_scalar_takes_surface_of_4d_field() {
        let field = FieldSpec::scalar("o3").extract(&provider()).unwrap();
        let SimulatedField::Scalar(o3) = field else {
            panic!("expected scalar field");
        };
        assert_eq!(o3.shape(), &[1, 2, 2]);
        assert_eq!(o3.series_at(GridIndex { x: 1, y: 1 }).unwrap(), vec![0.04]);
    }

    #[test]
    fn test_missing_field() {
        let err = FieldSpec::scalar("PSFC").extract(&provider()).unwrap_err();
        assert!(matches!(err, FieldError::MissingField(name) if name == "PSFC"));
    }

    #[test]
    fn test_wind_components_to_direction() {
        let spec = FieldSpec::WindComponents {
            u: "U10".to_string(),
            v: "V10".to_string(),
        };
        let SimulatedField::Wind { speed, direction } = spec.extract(&provider()).unwrap() else {
            panic!("expected wind field");
        };
        let cell = GridIndex { x: 0, y: 0 };
        assert_eq!(speed.series_at(cell).unwrap(), vec![3.0]);
        // Southward flow is a northerly wind.
        let wd = direction.series_at(cell).unwrap()[0];
        assert!(wd.min(360.0 - wd) < 1e-9);
    }

    #[test]
    fn test_grid_components_rotated_before_direction() {
        // With α = 90° the grid's -v direction points east: a westerly wind.
        let spec = FieldSpec::GridWindComponents {
            u: "U10".to_string(),
            v: "V10".to_string(),
            cosalpha: "COSALPHA".to_string(),
            sinalpha: "SINALPHA".to_string(),
        };
        let SimulatedField::Wind { speed, direction } = spec.extract(&provider()).unwrap() else {
            panic!("expected wind field");
        };
        let cell = GridIndex { x: 1, y: 0 };
        assert_eq!(speed.series_at(cell).unwrap(), vec![3.0]);
        assert!((direction.series_at(cell).unwrap()[0] - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_fields_requires_specs() {
        assert!(matches!(
            extract_fields(&provider(), &[]),
            Err(FieldError::NoFields)
        ));
    }
}
