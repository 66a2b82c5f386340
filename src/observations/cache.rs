//! On-disk cache of retrieved observation tables.
//!
//! One parquet file per (parameter group, date window) holds every station of
//! that retrieval, with columns `code`, `name`, `datetime` and the group's
//! variables.

use crate::observations::error::ObservationError;
use crate::types::date_window::DateWindow;
use crate::types::parameter::ParameterGroup;
use crate::types::station::StationCode;
use crate::types::station_table::{StationTable, StationTables, DATETIME_COL};
use chrono_tz::Tz;
use log::{info, warn};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

const CODE_COL: &str = "code";
const NAME_COL: &str = "name";

/// Identifies one retrieval: a parameter group over a date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub group: ParameterGroup,
    pub window: DateWindow,
}

impl CacheKey {
    pub fn new(group: ParameterGroup, window: DateWindow) -> Self {
        Self { group, window }
    }

    /// `met_21_06_2018-25_06_2018.parquet` and the like.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.parquet",
            self.group.cache_file_prefix(),
            self.window.cache_label()
        )
    }
}

/// Storage for complete retrieval results.
///
/// Implementations are not required to support concurrent runs against the
/// same key.
#[allow(async_fn_in_trait)]
pub trait ObservationCache {
    /// `None` on a miss.
    async fn load(&self, key: &CacheKey) -> Result<Option<StationTables>, ObservationError>;

    async fn store(&self, key: &CacheKey, tables: &StationTables) -> Result<(), ObservationError>;
}

/// Parquet files in a cache directory.
///
/// Writes go to a temporary file in the same directory that is then renamed
/// into place, so a reader never sees a partial file. Two runs storing the
/// same key at once are unsupported; the last rename wins.
#[derive(Debug, Clone)]
pub struct ParquetCache {
    dir: PathBuf,
    zone: Tz,
}

impl ParquetCache {
    /// `zone` is the display zone given to loaded tables.
    pub fn new(dir: &Path, zone: Tz) -> Self {
        Self {
            dir: dir.to_path_buf(),
            zone,
        }
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn decode(path: &Path, df: DataFrame, zone: Tz) -> Result<StationTables, ObservationError> {
        let corrupt = |message: String| ObservationError::CacheDecode {
            path: path.to_path_buf(),
            message,
        };
        let codes: Vec<Option<i64>> = df
            .column(CODE_COL)
            .and_then(|c| c.cast(&DataType::Int64))
            .map_err(|e| corrupt(e.to_string()))?
            .i64()
            .map_err(|e| corrupt(e.to_string()))?
            .into_iter()
            .collect();
        let names = df.column(NAME_COL).map_err(|e| corrupt(e.to_string()))?;
        let names = names.str().map_err(|e| corrupt(e.to_string()))?;

        let mut stations: BTreeMap<StationCode, String> = BTreeMap::new();
        for (row, (code, name)) in codes.iter().zip(names.into_iter()).enumerate() {
            let code = code
                .and_then(|c| u32::try_from(c).ok())
                .ok_or_else(|| corrupt(format!("invalid station code in row {row}")))?;
            let name = name.ok_or_else(|| corrupt(format!("missing station name in row {row}")))?;
            stations
                .entry(StationCode(code))
                .or_insert_with(|| name.to_string());
        }

        let mut selection = vec![col(DATETIME_COL)];
        for column in df.get_column_names() {
            let column = column.as_str();
            if column != CODE_COL && column != NAME_COL && column != DATETIME_COL {
                selection.push(col(column));
            }
        }

        let mut tables = StationTables::new();
        for (code, name) in stations {
            let frame = df
                .clone()
                .lazy()
                .filter(col(CODE_COL).eq(lit(code.get() as i64)))
                .select(selection.clone())
                .collect()?;
            tables.insert(code, StationTable::from_frame(code, name, zone, frame)?);
        }
        Ok(tables)
    }

    fn encode(tables: &StationTables) -> PolarsResult<DataFrame> {
        let mut combined: Option<DataFrame> = None;
        for table in tables.values() {
            let height = table.height();
            let mut columns: Vec<Column> = vec![
                Series::new(CODE_COL.into(), vec![table.code().get() as i64; height]).into(),
                Series::new(NAME_COL.into(), vec![table.name().to_string(); height]).into(),
            ];
            columns.extend(table.frame().get_columns().iter().cloned());
            let df = DataFrame::new(columns)?;
            match combined.as_mut() {
                Some(all) => {
                    all.vstack_mut(&df)?;
                }
                None => combined = Some(df),
            }
        }
        match combined {
            Some(df) => Ok(df),
            None => DataFrame::new(vec![
                Series::new_empty(CODE_COL.into(), &DataType::Int64).into(),
                Series::new_empty(NAME_COL.into(), &DataType::String).into(),
                Series::new_empty(
                    DATETIME_COL.into(),
                    &DataType::Datetime(TimeUnit::Milliseconds, None),
                )
                .into(),
            ]),
        }
    }
}

impl ObservationCache for ParquetCache {
    async fn load(&self, key: &CacheKey) -> Result<Option<StationTables>, ObservationError> {
        let path = self.path_for(key);
        if fs::metadata(&path).await.is_err() {
            warn!(
                "Cache miss for {} observations {} at {:?}",
                key.group, key.window, path
            );
            return Ok(None);
        }
        info!(
            "Cache hit for {} observations {} at {:?}",
            key.group, key.window, path
        );
        let zone = self.zone;
        let tables = task::spawn_blocking(move || {
            let df = LazyFrame::scan_parquet(&path, Default::default())
                .and_then(|lf| lf.collect())
                .map_err(|e| ObservationError::CacheRead(path.clone(), e))?;
            Self::decode(&path, df, zone)
        })
        .await??;
        Ok(Some(tables))
    }

    async fn store(&self, key: &CacheKey, tables: &StationTables) -> Result<(), ObservationError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ObservationError::CacheWrite(self.dir.clone(), e))?;
        let path = self.path_for(key);
        let dir = self.dir.clone();
        let mut df = Self::encode(tables).map_err(|e| ObservationError::CacheEncode(path.clone(), e))?;
        let station_count = tables.len();

        task::spawn_blocking(move || {
            let mut temp = NamedTempFile::new_in(&dir)
                .map_err(|e| ObservationError::CacheWrite(dir.clone(), e))?;
            ParquetWriter::new(temp.as_file_mut())
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| ObservationError::CacheEncode(path.clone(), e))?;
            temp.persist(&path)
                .map_err(|e| ObservationError::CacheWrite(path.clone(), e.error))?;
            info!("Cached {} stations to {:?}", station_count, path);
            Ok::<(), ObservationError>(())
        })
        .await??;
        Ok(())
    }
}
