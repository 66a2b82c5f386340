//! Entry point that wires station location, observation retrieval,
//! colocation and statistics together for one simulation run.

use crate::colocation::colocate_in_zone;
use crate::error::EvalError;
use crate::evaluation::{prepare_evaluation, Evaluation};
use crate::observations::cache::ParquetCache;
use crate::observations::retriever::{ObservationRetriever, RetrievalOptions};
use crate::observations::source::ObservationSource;
use crate::stations::locate_station::StationLocator;
use crate::stations::projection::GridProjection;
use crate::statistics::summary::{all_stations_stats, global_stats, StatisticsTable};
use crate::types::date_window::DateWindow;
use crate::types::gridded_field::SimulatedField;
use crate::types::parameter::ParameterGroup;
use crate::types::station::Station;
use crate::types::station_table::StationTables;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use chrono::NaiveDate;
use chrono_tz::UTC;
use log::info;
use std::path::{Path, PathBuf};

/// Aligned tables of a run together with their statistics.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub evaluation: Evaluation,
    pub per_station: StatisticsTable,
    pub global: StatisticsTable,
}

impl EvaluationReport {
    /// Writes both statistic tables into `dir` and returns their paths,
    /// per-station first.
    pub fn write_csv(&self, dir: &Path) -> Result<Vec<PathBuf>, EvalError> {
        Ok(vec![
            self.per_station.write_csv(dir)?,
            self.global.write_csv(dir)?,
        ])
    }
}

/// Evaluation client for one observation source.
///
/// Observations go through a parquet cache in `cache_folder`, so a repeated
/// run over the same dates does not hit the source again.
///
/// ```no_run
/// # use wrf_eval::{Credentials, EvalError, ModelEval, QualarClient};
/// # async fn run() -> Result<(), EvalError> {
/// let source = QualarClient::new(Credentials::from_env()?)?;
/// let client = ModelEval::new(source).await?;
/// # Ok(())
/// # }
/// ```
pub struct ModelEval<S> {
    retriever: ObservationRetriever<S, ParquetCache>,
    cache_folder: PathBuf,
}

#[bon]
impl<S: ObservationSource> ModelEval<S> {
    /// Client caching into `cache_folder`, created when missing.
    pub async fn with_cache_folder(cache_folder: PathBuf, source: S) -> Result<Self, EvalError> {
        Self::with_options(cache_folder, source, RetrievalOptions::default()).await
    }

    /// Client caching into the user's cache directory.
    pub async fn new(source: S) -> Result<Self, EvalError> {
        let cache_folder = get_cache_dir().ok_or(EvalError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder, source).await
    }

    pub async fn with_options(
        cache_folder: PathBuf,
        source: S,
        options: RetrievalOptions,
    ) -> Result<Self, EvalError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| EvalError::CacheDirCreation(cache_folder.clone(), e))?;
        let cache = ParquetCache::new(&cache_folder, options.zone);
        Ok(Self {
            retriever: ObservationRetriever::new(source, cache, options),
            cache_folder,
        })
    }

    pub fn cache_folder(&self) -> &Path {
        &self.cache_folder
    }

    pub fn source(&self) -> &S {
        self.retriever.source()
    }

    /// Stations of the catalog CSV at `catalog` that fall inside a grid of
    /// `grid_shape` (height, width) cells.
    #[builder]
    pub fn locate_stations(
        &self,
        catalog: &Path,
        projection: &dyn GridProjection,
        grid_shape: (usize, usize),
    ) -> Result<Vec<Station>, EvalError> {
        let locator = StationLocator::from_catalog_file(catalog)?;
        Ok(locator.stations_in_domain(projection, grid_shape))
    }

    /// Observed tables of one parameter group, from the cache when present.
    #[builder]
    pub async fn observations(
        &self,
        stations: &[Station],
        group: ParameterGroup,
        window: DateWindow,
    ) -> Result<StationTables, EvalError> {
        Ok(self
            .retriever
            .retrieve_group(stations, group, window)
            .await?)
    }

    /// Simulated tables at each station. With `to_local` (default `false`)
    /// the tables are shown in the observation zone instead of UTC.
    #[builder]
    pub fn colocate(
        &self,
        fields: &[SimulatedField],
        stations: &[Station],
        to_local: Option<bool>,
    ) -> Result<StationTables, EvalError> {
        let zone = if to_local.unwrap_or(false) {
            self.retriever.options().zone
        } else {
            UTC
        };
        Ok(colocate_in_zone(fields, stations, zone)?)
    }

    /// Trims the spin-up, aligns observations and computes per-station and
    /// global statistics. `variables` defaults to every observed variable.
    #[builder]
    pub fn evaluate(
        &self,
        simulated: &StationTables,
        observed: &StationTables,
        spin_up_end: NaiveDate,
        variables: Option<&[&str]>,
        sort_by_variable: Option<bool>,
    ) -> Result<EvaluationReport, EvalError> {
        let evaluation = prepare_evaluation(simulated, observed, spin_up_end)?;
        let per_station =
            all_stations_stats(&evaluation, variables, sort_by_variable.unwrap_or(false))?;
        let global = global_stats(&evaluation, variables)?;
        info!(
            "Evaluated {} stations: {} station records, {} global records",
            evaluation.observed.len(),
            per_station.records().len(),
            global.records().len()
        );
        Ok(EvaluationReport {
            evaluation,
            per_station,
            global,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::error::ObservationError;
    use crate::observations::table_parser::Reading;
    use crate::stations::projection::RegularLatLon;
    use crate::types::gridded_field::GriddedField;
    use crate::types::parameter::Parameter;
    use crate::types::station::StationCode;
    use crate::utils::local_to_utc;
    use crate::SAO_PAULO;
    use chrono::NaiveDateTime;
    use ndarray::Array3;
    use std::cell::Cell;
    use std::io::Write;

    /// Ozone of 40 at every hour, nothing else.
    struct ConstantOzone {
        calls: Cell<usize>,
    }

    impl ObservationSource for ConstantOzone {
        async fn hourly_values(
            &self,
            _station: StationCode,
            parameter: Parameter,
            window: &DateWindow,
        ) -> Result<Vec<Reading>, ObservationError> {
            self.calls.set(self.calls.get() + 1);
            if parameter != Parameter::Ozone {
                return Ok(Vec::new());
            }
            Ok(window
                .hourly_steps()
                .into_iter()
                .map(|local| Reading { local, value: 40.0 })
                .collect())
        }
    }

    fn source() -> ConstantOzone {
        ConstantOzone {
            calls: Cell::new(0),
        }
    }

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2018, 6, 21).unwrap(),
            NaiveDate::from_ymd_opt(2018, 6, 22).unwrap(),
        )
    }

    fn station() -> Station {
        Station {
            code: StationCode(99),
            name: "Pinheiros".to_string(),
            location: crate::types::station::Location {
                latitude: -23.56,
                longitude: -46.70,
            },
            grid: crate::types::station::GridIndex { x: 2, y: 1 },
        }
    }

    fn simulation_times() -> Vec<NaiveDateTime> {
        window()
            .hourly_steps()
            .iter()
            .filter_map(|local| local_to_utc(SAO_PAULO, local))
            .collect()
    }

    fn ozone_field(value: f64) -> SimulatedField {
        let times = simulation_times();
        let values = Array3::from_elem((times.len(), 3, 4), value).into_dyn();
        SimulatedField::Scalar(GriddedField::new("o3", "ug m-3", times, values).unwrap())
    }

    #[tokio::test]
    async fn test_creates_cache_folder() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let folder = dir.path().join("nested").join("cache");
        let client = ModelEval::with_cache_folder(folder.clone(), source()).await?;
        assert!(folder.is_dir());
        assert_eq!(client.cache_folder(), folder.as_path());
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_folder_is_a_file() -> Result<(), Box<dyn std::error::Error>> {
        let file = tempfile::NamedTempFile::new()?;
        let result = ModelEval::with_cache_folder(file.path().to_path_buf(), source()).await;
        assert!(matches!(result, Err(EvalError::CacheDirCreation(_, _))));
        Ok(())
    }

    #[tokio::test]
    async fn test_locate_stations() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let client = ModelEval::with_cache_folder(dir.path().to_path_buf(), source()).await?;

        let mut catalog = tempfile::NamedTempFile::new()?;
        write!(
            catalog,
            "code,name,lat,lon\n99,Pinheiros,-23.5,-46.5\n1,Far away,-10.0,-40.0\n"
        )?;
        let projection = RegularLatLon {
            origin_lat: -24.0,
            origin_lon: -47.0,
            dlat: 0.1,
            dlon: 0.1,
        };
        let stations = client
            .locate_stations()
            .catalog(catalog.path())
            .projection(&projection)
            .grid_shape((10, 10))
            .call()?;
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].code, StationCode(99));
        assert_eq!(stations[0].grid.x, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_full_run() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let client = ModelEval::with_cache_folder(dir.path().to_path_buf(), source()).await?;
        let stations = vec![station()];

        let observed = client
            .observations()
            .stations(&stations)
            .group(ParameterGroup::Pollutants)
            .window(window())
            .call()
            .await?;
        let calls = client.source().calls.get();
        assert_eq!(calls, ParameterGroup::Pollutants.parameters().len());

        let again = client
            .observations()
            .stations(&stations)
            .group(ParameterGroup::Pollutants)
            .window(window())
            .call()
            .await?;
        assert_eq!(client.source().calls.get(), calls);
        assert_eq!(again.len(), 1);

        let simulated = client
            .colocate()
            .fields(&[ozone_field(50.0)])
            .stations(&stations)
            .to_local(true)
            .call()?;

        let report = client
            .evaluate()
            .simulated(&simulated)
            .observed(&observed)
            .spin_up_end(NaiveDate::from_ymd_opt(2018, 6, 22).unwrap())
            .variables(&["o3"])
            .call()?;
        assert_eq!(report.evaluation.observed[&StationCode(99)].height(), 24);
        let o3 = report
            .per_station
            .record("o3", Some("Pinheiros"))
            .ok_or("missing o3 record")?;
        assert_eq!(o3.mb, 10.0);
        assert_eq!(o3.nmb, Some(25.0));
        assert_eq!(report.global.records()[0].me, 10.0);

        let written = report.write_csv(dir.path())?;
        assert!(written.iter().all(|p| p.is_file()));
        Ok(())
    }
}
