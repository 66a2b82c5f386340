//! Assembles per-station observation tables for a parameter group, going
//! through the cache before touching the source.

use crate::observations::cache::{CacheKey, ObservationCache};
use crate::observations::error::ObservationError;
use crate::observations::source::ObservationSource;
use crate::observations::table_parser::Reading;
use crate::types::date_window::DateWindow;
use crate::types::parameter::{Parameter, ParameterGroup};
use crate::types::station::{Station, StationCode};
use crate::types::station_table::{
    StationTable, StationTables, DATETIME_COL, DATE_COL, DATE_FORMAT, DATE_OFFSET_FORMAT,
};
use crate::utils::local_to_utc;
use crate::SAO_PAULO;
use bon::Builder;
use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

const CELSIUS_TO_KELVIN: f64 = 273.15;
const MAX_WIND_DIRECTION: f64 = 360.0;

/// How raw readings become table values.
#[derive(Debug, Clone, Builder)]
pub struct RetrievalOptions {
    /// Report temperature in Kelvin instead of °C.
    #[builder(default = true)]
    pub kelvin: bool,
    /// Turn wind directions above 360° (777/888 flags) into missing values.
    #[builder(default = true)]
    pub remove_flags: bool,
    /// Zone of the source's wall-clock timestamps.
    #[builder(default = SAO_PAULO)]
    pub zone: Tz,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetrievalOptions {
    fn adjust(&self, parameter: Parameter, value: f64) -> Option<f64> {
        match parameter {
            Parameter::Temperature if self.kelvin => Some(value + CELSIUS_TO_KELVIN),
            Parameter::WindDirection if self.remove_flags && value > MAX_WIND_DIRECTION => None,
            _ => Some(value),
        }
    }
}

/// Places readings on `steps`; hours without a reading are missing and
/// readings off the grid are ignored.
pub fn hourly_series(readings: &[Reading], steps: &[NaiveDateTime]) -> Vec<Option<f64>> {
    let mut by_time: HashMap<NaiveDateTime, f64> = HashMap::with_capacity(readings.len());
    for reading in readings {
        by_time.entry(reading.local).or_insert(reading.value);
    }
    steps.iter().map(|step| by_time.get(step).copied()).collect()
}

/// UTC instants of the window's local hourly steps, with the position of each
/// kept step. Local times skipped by a DST change are dropped.
fn utc_steps(window: &DateWindow, zone: Tz) -> (Vec<NaiveDateTime>, Vec<usize>) {
    let mut utc = Vec::new();
    let mut kept = Vec::new();
    for (i, local) in window.hourly_steps().iter().enumerate() {
        match local_to_utc(zone, local) {
            Some(instant) => {
                utc.push(instant);
                kept.push(i);
            }
            None => warn!("Local time {} does not exist in {}, dropping it", local, zone),
        }
    }
    (utc, kept)
}

pub struct ObservationRetriever<S, C> {
    source: S,
    cache: C,
    options: RetrievalOptions,
}

impl<S: ObservationSource, C: ObservationCache> ObservationRetriever<S, C> {
    pub fn new(source: S, cache: C, options: RetrievalOptions) -> Self {
        Self {
            source,
            cache,
            options,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &RetrievalOptions {
        &self.options
    }

    /// One table with the group's columns for a single station.
    pub async fn retrieve_station(
        &self,
        station: &Station,
        group: ParameterGroup,
        window: &DateWindow,
    ) -> Result<StationTable, ObservationError> {
        let local_steps = window.hourly_steps();
        let (utc, kept) = utc_steps(window, self.options.zone);

        let mut columns = Vec::with_capacity(group.parameters().len());
        for &parameter in group.parameters() {
            let readings = self
                .source
                .hourly_values(station.code, parameter, window)
                .await?;
            debug!(
                "Station {} {}: {} readings",
                station.code,
                parameter,
                readings.len()
            );
            let series = hourly_series(&readings, &local_steps);
            let values = kept
                .iter()
                .map(|&i| series[i].and_then(|v| self.options.adjust(parameter, v)))
                .collect();
            columns.push((parameter.column().to_string(), values));
        }

        Ok(StationTable::from_columns(
            station.code,
            station.name.clone(),
            self.options.zone,
            &utc,
            columns,
        )?)
    }

    /// Tables of every station for one group and window.
    ///
    /// A cached result is returned as is. Otherwise every station is retrieved
    /// in turn and the complete set is stored before returning.
    pub async fn retrieve_group(
        &self,
        stations: &[Station],
        group: ParameterGroup,
        window: DateWindow,
    ) -> Result<StationTables, ObservationError> {
        let key = CacheKey::new(group, window);
        if let Some(tables) = self.cache.load(&key).await? {
            return Ok(tables);
        }

        info!(
            "Retrieving {} for {} stations, {}",
            group,
            stations.len(),
            window
        );
        let mut tables = StationTables::new();
        for station in stations {
            let table = self.retrieve_station(station, group, &window).await?;
            tables.insert(station.code, table);
        }
        self.cache.store(&key, &tables).await?;
        Ok(tables)
    }
}

/// Reads an exported observation CSV: a `date` column plus variable columns.
///
/// Dates with a UTC offset (`%Y-%m-%d %H:%M:%S%:z`, as written by
/// [`StationTable::write_csv`]) are exact instants. Dates without one are
/// wall-clock times of `zone`.
pub fn read_observation_csv(
    path: &Path,
    code: StationCode,
    name: &str,
    separator: u8,
    zone: Tz,
) -> Result<StationTable, ObservationError> {
    let read_err = |e: PolarsError| ObservationError::CsvRead(path.to_path_buf(), e);
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(read_err)?
        .finish()
        .map_err(read_err)?;

    let dates = df.column(DATE_COL).map_err(read_err)?;
    let dates = dates.str().map_err(read_err)?;
    let mut utc = Vec::with_capacity(dates.len());
    let mut keep = Vec::with_capacity(dates.len());
    for date in dates.into_iter() {
        let Some(date) = date else {
            keep.push(false);
            continue;
        };
        if let Ok(stamped) = DateTime::parse_from_str(date, DATE_OFFSET_FORMAT) {
            utc.push(stamped.naive_utc().and_utc().timestamp_millis());
            keep.push(true);
            continue;
        }
        let local = NaiveDateTime::parse_from_str(date, DATE_FORMAT).map_err(|source| {
            ObservationError::DateParse {
                value: date.to_string(),
                source,
            }
        })?;
        match local_to_utc(zone, &local) {
            Some(instant) => {
                utc.push(instant.and_utc().timestamp_millis());
                keep.push(true);
            }
            None => {
                warn!("Local time {} does not exist in {}, dropping it", local, zone);
                keep.push(false);
            }
        }
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let rest = df.drop(DATE_COL)?.filter(&mask)?;
    let mut columns: Vec<Column> = vec![Series::new(DATETIME_COL.into(), utc)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .into()];
    columns.extend(rest.get_columns().iter().cloned());

    Ok(StationTable::from_frame(
        code,
        name,
        zone,
        DataFrame::new(columns)?,
    )?)
}

/// Reads `<code><suffix>` from `dir` for every station.
pub fn read_observation_csvs(
    dir: &Path,
    stations: &[Station],
    suffix: &str,
    separator: u8,
    zone: Tz,
) -> Result<StationTables, ObservationError> {
    stations
        .iter()
        .map(|station| {
            let path = dir.join(format!("{}{}", station.code, suffix));
            read_observation_csv(&path, station.code, &station.name, separator, zone)
                .map(|table| (station.code, table))
        })
        .collect()
}
