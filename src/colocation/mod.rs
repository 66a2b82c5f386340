//! Simulated series at station grid cells.

use crate::fields::error::FieldError;
use crate::types::gridded_field::SimulatedField;
use crate::types::station::Station;
use crate::types::station_table::{StationTable, StationTables};
use crate::SAO_PAULO;
use chrono_tz::{Tz, UTC};
use log::info;

/// One table per station with a column per simulated variable. Timestamps
/// are UTC; with `to_local` the tables are shown in São Paulo time.
pub fn colocate(
    fields: &[SimulatedField],
    stations: &[Station],
    to_local: bool,
) -> Result<StationTables, FieldError> {
    let zone = if to_local { SAO_PAULO } else { UTC };
    colocate_in_zone(fields, stations, zone)
}

pub fn colocate_in_zone(
    fields: &[SimulatedField],
    stations: &[Station],
    zone: Tz,
) -> Result<StationTables, FieldError> {
    let first = fields.first().ok_or(FieldError::NoFields)?;
    let times = first.times();
    for field in &fields[1..] {
        if field.times().len() != times.len() {
            return Err(FieldError::TimeMismatch {
                name: field.column_names().join("/"),
                expected: times.len(),
                found: field.times().len(),
            });
        }
    }

    let mut tables = StationTables::new();
    for station in stations {
        let mut columns = Vec::new();
        for field in fields {
            columns.extend(field.columns_at(station.grid)?);
        }
        let table =
            StationTable::from_columns(station.code, station.name.clone(), zone, times, columns)?;
        tables.insert(station.code, table);
    }
    info!(
        "Colocated {} fields at {} stations over {} steps",
        fields.len(),
        stations.len(),
        times.len()
    );
    Ok(tables)
}
