//! Defines the QualAr parameters this crate retrieves and how they are grouped
//! into meteorological and pollutant tables.

use std::fmt;

/// A QualAr measured parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Air temperature (°C at the source).
    Temperature,
    /// Relative humidity (%).
    RelativeHumidity,
    /// Wind speed (m/s).
    WindSpeed,
    /// Wind direction (degrees). Values above 360 are sentinel codes.
    WindDirection,
    /// Ozone (µg/m³).
    Ozone,
    /// Nitric oxide (µg/m³).
    NitricOxide,
    /// Nitrogen dioxide (µg/m³).
    NitrogenDioxide,
    /// Carbon monoxide (ppm).
    CarbonMonoxide,
}

impl Parameter {
    /// The `parametroVO.nparmt` code used by the QualAr export form.
    pub fn code(&self) -> u32 {
        match self {
            Parameter::Temperature => 25,
            Parameter::RelativeHumidity => 28,
            Parameter::WindSpeed => 24,
            Parameter::WindDirection => 23,
            Parameter::Ozone => 63,
            Parameter::NitricOxide => 17,
            Parameter::NitrogenDioxide => 15,
            Parameter::CarbonMonoxide => 16,
        }
    }

    /// Column name in station tables; matches the lower-cased simulated
    /// variable the parameter is compared against.
    pub fn column(&self) -> &'static str {
        match self {
            Parameter::Temperature => "t2",
            Parameter::RelativeHumidity => "rh2",
            Parameter::WindSpeed => "ws",
            Parameter::WindDirection => "wd",
            Parameter::Ozone => "o3",
            Parameter::NitricOxide => "no",
            Parameter::NitrogenDioxide => "no2",
            Parameter::CarbonMonoxide => "co",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.column(), self.code())
    }
}

/// Parameters are downloaded, cached and evaluated per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterGroup {
    Meteorology,
    Pollutants,
}

impl ParameterGroup {
    pub fn parameters(&self) -> &'static [Parameter] {
        match self {
            ParameterGroup::Meteorology => &[
                Parameter::Temperature,
                Parameter::RelativeHumidity,
                Parameter::WindSpeed,
                Parameter::WindDirection,
            ],
            ParameterGroup::Pollutants => &[
                Parameter::Ozone,
                Parameter::NitricOxide,
                Parameter::NitrogenDioxide,
                Parameter::CarbonMonoxide,
            ],
        }
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.parameters().iter().map(Parameter::column).collect()
    }

    pub(crate) fn cache_file_prefix(&self) -> &'static str {
        match self {
            ParameterGroup::Meteorology => "met",
            ParameterGroup::Pollutants => "pol",
        }
    }
}

impl fmt::Display for ParameterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterGroup::Meteorology => write!(f, "meteorology"),
            ParameterGroup::Pollutants => write!(f, "pollutants"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_columns() {
        assert_eq!(
            ParameterGroup::Meteorology.columns(),
            ["t2", "rh2", "ws", "wd"]
        );
        assert_eq!(
            ParameterGroup::Pollutants.columns(),
            ["o3", "no", "no2", "co"]
        );
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<u32> = ParameterGroup::Meteorology
            .parameters()
            .iter()
            .chain(ParameterGroup::Pollutants.parameters())
            .map(Parameter::code)
            .collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 8);
    }
}
