use crate::fields::error::FieldError;
use crate::types::gridded_field::GriddedField;
use crate::types::parameter::Parameter;
use ndarray::Zip;

/// Universal gas constant, J/(K·mol).
pub const GAS_CONSTANT: f64 = 8.3142;

/// Molar masses in g/mol.
pub mod molar_mass {
    pub const O3: f64 = 48.0;
    pub const NO: f64 = 30.0;
    pub const NO2: f64 = 46.0;
    pub const CO: f64 = 28.0;
}

/// Molar mass of a gas-phase pollutant parameter.
pub fn molar_mass_of(parameter: Parameter) -> Option<f64> {
    match parameter {
        Parameter::Ozone => Some(molar_mass::O3),
        Parameter::NitricOxide => Some(molar_mass::NO),
        Parameter::NitrogenDioxide => Some(molar_mass::NO2),
        Parameter::CarbonMonoxide => Some(molar_mass::CO),
        _ => None,
    }
}

/// Converts a mixing ratio in ppm to a mass concentration in µg/m³ using
/// temperature `t2` (K) and surface pressure `psfc` (Pa) on the same grid.
///
/// The result keeps the pollutant's name and time coordinate.
pub fn ppm_to_ugm3(
    pol: &GriddedField,
    t2: &GriddedField,
    psfc: &GriddedField,
    molar_mass: f64,
) -> Result<GriddedField, FieldError> {
    for other in [t2, psfc] {
        if other.shape() != pol.shape() {
            return Err(FieldError::ShapeMismatch {
                name: other.name().to_string(),
                expected: pol.shape().to_vec(),
                found: other.shape().to_vec(),
            });
        }
    }
    let values = Zip::from(pol.values())
        .and(t2.values())
        .and(psfc.values())
        .map_collect(|c, t, p| c * p * molar_mass / (GAS_CONSTANT * t));
    Ok(pol.with_values("ug m-3", values))
}
