//! Per-station time series tables shared by every stage of an evaluation.

use crate::error::EvalError;
use crate::types::station::StationCode;
use crate::utils::utc_to_local;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Name of the timestamp column of every station table.
pub const DATETIME_COL: &str = "datetime";

/// Name of the local timestamp column written by [`StationTable::write_csv`].
pub const DATE_COL: &str = "date";

/// Wall-clock format of `date` columns without an offset.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the `date` column in exported tables. The offset keeps the
/// repeated hour of a DST fall-back apart.
pub const DATE_OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Station tables of one stage, keyed by station.
pub type StationTables = BTreeMap<StationCode, StationTable>;

/// Time series of one station, one `Float64` column per variable.
///
/// The `datetime` column holds naive UTC instants (`Datetime(Milliseconds, None)`),
/// the way cached frames store them. `zone` only decides how timestamps are
/// displayed and which local midnight bounds the spin-up.
#[derive(Debug, Clone)]
pub struct StationTable {
    code: StationCode,
    name: String,
    zone: Tz,
    frame: DataFrame,
}

fn datetime_type() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

impl StationTable {
    /// Builds a table from UTC timestamps and named columns of equal length.
    pub fn from_columns(
        code: StationCode,
        name: impl Into<String>,
        zone: Tz,
        datetimes: &[NaiveDateTime],
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> PolarsResult<Self> {
        let millis: Vec<i64> = datetimes
            .iter()
            .map(|dt| dt.and_utc().timestamp_millis())
            .collect();
        let mut frame_columns: Vec<Column> = Vec::with_capacity(columns.len() + 1);
        frame_columns.push(
            Series::new(DATETIME_COL.into(), millis)
                .cast(&datetime_type())?
                .into(),
        );
        for (column, values) in columns {
            frame_columns.push(Series::new(column.into(), values).into());
        }
        Ok(Self {
            code,
            name: name.into(),
            zone,
            frame: DataFrame::new(frame_columns)?,
        })
    }

    /// Wraps an existing frame. Its `datetime` column is normalized to
    /// millisecond precision and every other column to `Float64`.
    pub fn from_frame(
        code: StationCode,
        name: impl Into<String>,
        zone: Tz,
        frame: DataFrame,
    ) -> PolarsResult<Self> {
        let mut casts = vec![col(DATETIME_COL).cast(datetime_type())];
        for column in frame.get_column_names() {
            if column.as_str() != DATETIME_COL {
                casts.push(col(column.as_str()).cast(DataType::Float64));
            }
        }
        let frame = frame.lazy().select(casts).collect()?;
        Ok(Self {
            code,
            name: name.into(),
            zone,
            frame,
        })
    }

    pub fn code(&self) -> StationCode {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Same data shown in another zone.
    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }

    /// Variable column names, in table order.
    pub fn variables(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != DATETIME_COL)
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_variable(&self, variable: &str) -> bool {
        variable != DATETIME_COL && self.frame.column(variable).is_ok()
    }

    /// UTC timestamps of every row.
    pub fn datetimes(&self) -> PolarsResult<Vec<NaiveDateTime>> {
        let column = self.frame.column(DATETIME_COL)?.cast(&datetime_type())?;
        column
            .datetime()?
            .into_iter()
            .map(|ms| {
                ms.and_then(DateTime::from_timestamp_millis)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| {
                        PolarsError::ComputeError("invalid timestamp in station table".into())
                    })
            })
            .collect()
    }

    /// Row timestamps as wall-clock times of the table's zone.
    pub fn local_datetimes(&self) -> PolarsResult<Vec<NaiveDateTime>> {
        Ok(self
            .datetimes()?
            .iter()
            .map(|dt| utc_to_local(self.zone, dt))
            .collect())
    }

    pub fn values(&self, variable: &str) -> PolarsResult<Vec<Option<f64>>> {
        let column = self.frame.column(variable)?.cast(&DataType::Float64)?;
        Ok(column.f64()?.into_iter().collect())
    }

    /// Rows at or after `cutoff` (UTC).
    pub fn since(&self, cutoff: NaiveDateTime) -> PolarsResult<Self> {
        let frame = self
            .frame
            .clone()
            .lazy()
            .filter(col(DATETIME_COL).gt_eq(lit(cutoff)))
            .collect()?;
        Ok(Self {
            frame,
            ..self.clone()
        })
    }

    /// This table reindexed onto `index`'s timestamps: rows at other times are
    /// dropped and timestamps this table lacks come back as missing rows.
    /// Of several rows at one timestamp only the first is kept, so the result
    /// has exactly `index`'s rows when `index` has unique timestamps.
    pub fn aligned_to(&self, index: &StationTable) -> PolarsResult<Self> {
        let rows = self
            .frame
            .clone()
            .lazy()
            .unique_stable(Some(vec![DATETIME_COL.into()]), UniqueKeepStrategy::First);
        let frame = index
            .frame
            .clone()
            .lazy()
            .select([col(DATETIME_COL)])
            .left_join(rows, col(DATETIME_COL), col(DATETIME_COL))
            .sort([DATETIME_COL], SortMultipleOptions::default())
            .collect()?;
        Ok(Self {
            frame,
            ..self.clone()
        })
    }

    /// Writes the table as CSV with a local `date` column carrying its UTC
    /// offset, followed by the variables.
    pub fn write_csv(&self, path: &Path) -> Result<(), EvalError> {
        let dates: Vec<String> = self
            .datetimes()?
            .iter()
            .map(|dt| {
                self.zone
                    .from_utc_datetime(dt)
                    .format(DATE_OFFSET_FORMAT)
                    .to_string()
            })
            .collect();
        let mut columns: Vec<Column> = vec![Series::new(DATE_COL.into(), dates).into()];
        for variable in self.variables() {
            columns.push(self.frame.column(&variable)?.clone());
        }
        let mut out = DataFrame::new(columns)?;

        let mut file =
            File::create(path).map_err(|e| EvalError::OutputCreate(path.to_path_buf(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut out)
            .map_err(|e| EvalError::CsvWrite(path.to_path_buf(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::America::Sao_Paulo;
    use chrono_tz::UTC;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn table(hours: &[u32], values: Vec<Option<f64>>) -> StationTable {
        let times: Vec<_> = hours.iter().map(|h| at(21, *h)).collect();
        StationTable::from_columns(
            StationCode(99),
            "Pinheiros",
            UTC,
            &times,
            vec![("o3".to_string(), values)],
        )
        .unwrap()
    }

    #[test]
    fn test_columns_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let t = table(&[3, 4], vec![Some(1.0), None]);
        assert_eq!(t.variables(), vec!["o3".to_string()]);
        assert_eq!(t.datetimes()?, vec![at(21, 3), at(21, 4)]);
        assert_eq!(t.values("o3")?, vec![Some(1.0), None]);
        assert!(t.has_variable("o3"));
        assert!(!t.has_variable("datetime"));
        Ok(())
    }

    #[test]
    fn test_local_datetimes_follow_zone() -> Result<(), Box<dyn std::error::Error>> {
        let t = table(&[3], vec![Some(1.0)]).with_zone(Sao_Paulo);
        assert_eq!(t.local_datetimes()?, vec![at(21, 0)]);
        assert_eq!(t.datetimes()?, vec![at(21, 3)]);
        Ok(())
    }

    #[test]
    fn test_since_keeps_cutoff_row() -> Result<(), Box<dyn std::error::Error>> {
        let t = table(&[2, 3, 4], vec![Some(1.0), Some(2.0), Some(3.0)]);
        let trimmed = t.since(at(21, 3))?;
        assert_eq!(trimmed.datetimes()?, vec![at(21, 3), at(21, 4)]);
        Ok(())
    }

    #[test]
    fn test_aligned_to_reindexes() -> Result<(), Box<dyn std::error::Error>> {
        let sim = table(&[3, 4, 5], vec![Some(1.0), Some(2.0), Some(3.0)]);
        let obs = table(&[2, 3, 4], vec![Some(10.0), Some(20.0), Some(30.0)]);
        let aligned = obs.aligned_to(&sim)?;
        assert_eq!(aligned.datetimes()?, sim.datetimes()?);
        assert_eq!(aligned.values("o3")?, vec![Some(20.0), Some(30.0), None]);
        Ok(())
    }

    #[test]
    fn test_aligned_to_keeps_first_duplicate() -> Result<(), Box<dyn std::error::Error>> {
        let sim = table(&[3, 4], vec![Some(1.0), Some(2.0)]);
        let obs = table(&[3, 3, 4], vec![Some(10.0), Some(11.0), Some(20.0)]);
        let aligned = obs.aligned_to(&sim)?;
        assert_eq!(aligned.height(), sim.height());
        assert_eq!(aligned.values("o3")?, vec![Some(10.0), Some(20.0)]);
        Ok(())
    }

    #[test]
    fn test_write_csv_uses_local_dates() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("99.csv");
        table(&[3, 4], vec![Some(1.5), None])
            .with_zone(Sao_Paulo)
            .write_csv(&path)?;
        let text = std::fs::read_to_string(&path)?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,o3"));
        assert_eq!(lines.next(), Some("2018-06-21 00:00:00-03:00,1.5"));
        assert_eq!(lines.next(), Some("2018-06-21 01:00:00-03:00,"));
        Ok(())
    }
}
