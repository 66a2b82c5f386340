//! Per-station and pooled statistic tables and their CSV export.

use crate::error::EvalError;
use crate::evaluation::{Evaluation, EvaluationPair};
use crate::statistics::metrics::{
    complete_cases, correlation, mean, mean_bias, mean_gross_error, normalized_mean_bias,
    normalized_mean_error, root_mean_square_error, sample_std,
};
use crate::statistics::wind::{wind_dir_mean_bias, wind_dir_mean_gross_error};
use log::info;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Variable evaluated with circular differences.
pub const WIND_DIRECTION: &str = "wd";

/// Statistics of one variable at one station, or pooled over all stations
/// when `station` is `None`.
///
/// Wind direction records only carry MB and ME.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticRecord {
    pub variable: String,
    pub station: Option<String>,
    pub mb: f64,
    pub me: f64,
    pub rmse: Option<f64>,
    pub nmb: Option<f64>,
    pub nme: Option<f64>,
    pub r: Option<f64>,
    pub om: Option<f64>,
    pub mm: Option<f64>,
    pub ostd: Option<f64>,
    pub mstd: Option<f64>,
}

/// Statistics of `variable` for aligned simulated and observed values.
pub fn variable_stats(
    variable: &str,
    sim: &[Option<f64>],
    obs: &[Option<f64>],
    station: Option<String>,
) -> StatisticRecord {
    if variable == WIND_DIRECTION {
        return StatisticRecord {
            variable: variable.to_string(),
            station,
            mb: wind_dir_mean_bias(sim, obs),
            me: wind_dir_mean_gross_error(sim, obs),
            rmse: None,
            nmb: None,
            nme: None,
            r: None,
            om: None,
            mm: None,
            ostd: None,
            mstd: None,
        };
    }
    let pairs = complete_cases(sim, obs);
    StatisticRecord {
        variable: variable.to_string(),
        station,
        mb: mean_bias(&pairs),
        me: mean_gross_error(&pairs),
        rmse: Some(root_mean_square_error(&pairs)),
        nmb: Some(normalized_mean_bias(sim, obs)),
        nme: Some(normalized_mean_error(sim, obs)),
        r: Some(correlation(&pairs)),
        om: Some(mean(obs)),
        mm: Some(mean(sim)),
        ostd: Some(sample_std(obs)),
        mstd: Some(sample_std(sim)),
    }
}

fn selected_variables(pair: &EvaluationPair<'_>, variables: Option<&[&str]>) -> Vec<String> {
    match variables {
        Some(variables) => variables.iter().map(|v| v.to_string()).collect(),
        None => pair.observed.variables(),
    }
}

/// One record per variable for a station. Without a selection every
/// observed variable is evaluated.
pub fn station_stats(
    pair: &EvaluationPair<'_>,
    variables: Option<&[&str]>,
) -> PolarsResult<Vec<StatisticRecord>> {
    selected_variables(pair, variables)
        .iter()
        .map(|variable| {
            let (sim, obs) = pair.series(variable)?;
            Ok(variable_stats(
                variable,
                &sim,
                &obs,
                Some(pair.name().to_string()),
            ))
        })
        .collect()
}

/// A flat table of statistic records.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsTable {
    records: Vec<StatisticRecord>,
    global: bool,
}

impl StatisticsTable {
    pub fn records(&self) -> &[StatisticRecord] {
        &self.records
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn record(&self, variable: &str, station: Option<&str>) -> Option<&StatisticRecord> {
        self.records
            .iter()
            .find(|r| r.variable == variable && r.station.as_deref() == station)
    }

    /// Variables in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.variable.as_str()) {
                seen.push(&record.variable);
            }
        }
        seen
    }

    /// `o3_no_no2_co_stats.csv`, or `..._global_stats.csv` for pooled tables.
    pub fn file_name(&self) -> String {
        let suffix = if self.global {
            "_global_stats.csv"
        } else {
            "_stats.csv"
        };
        format!("{}{}", self.variables().join("_"), suffix)
    }

    /// Columns `pol, MB, ME, RMSE, NMB, NME, R, Om, Mm, Ostd, Mstd`, plus
    /// `aqs` with the station name unless the table is global.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let optional = |name: &str, get: fn(&StatisticRecord) -> Option<f64>| -> Column {
            Series::new(
                name.into(),
                self.records.iter().map(get).collect::<Vec<_>>(),
            )
            .into()
        };
        let mut columns: Vec<Column> = vec![
            Series::new(
                "pol".into(),
                self.records
                    .iter()
                    .map(|r| r.variable.clone())
                    .collect::<Vec<_>>(),
            )
            .into(),
            optional("MB", |r| Some(r.mb)),
            optional("ME", |r| Some(r.me)),
            optional("RMSE", |r| r.rmse),
            optional("NMB", |r| r.nmb),
            optional("NME", |r| r.nme),
            optional("R", |r| r.r),
            optional("Om", |r| r.om),
            optional("Mm", |r| r.mm),
            optional("Ostd", |r| r.ostd),
            optional("Mstd", |r| r.mstd),
        ];
        if !self.global {
            columns.push(
                Series::new(
                    "aqs".into(),
                    self.records
                        .iter()
                        .map(|r| r.station.clone())
                        .collect::<Vec<_>>(),
                )
                .into(),
            );
        }
        DataFrame::new(columns)
    }

    /// Writes the table into `dir` under [`StatisticsTable::file_name`].
    pub fn write_csv(&self, dir: &Path) -> Result<PathBuf, EvalError> {
        let path = dir.join(self.file_name());
        let mut df = self.to_frame()?;
        let mut file =
            File::create(&path).map_err(|e| EvalError::OutputCreate(path.clone(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut df)
            .map_err(|e| EvalError::CsvWrite(path.clone(), e))?;
        info!("Wrote {} statistic records to {:?}", self.records.len(), path);
        Ok(path)
    }
}

/// Per-station records of every paired station, in station order, optionally
/// sorted by variable.
pub fn all_stations_stats(
    evaluation: &Evaluation,
    variables: Option<&[&str]>,
    sort_by_variable: bool,
) -> Result<StatisticsTable, EvalError> {
    let mut records = Vec::new();
    for pair in evaluation.pairs() {
        records.extend(station_stats(&pair, variables)?);
    }
    if sort_by_variable {
        records.sort_by(|a, b| a.variable.cmp(&b.variable));
    }
    Ok(StatisticsTable {
        records,
        global: false,
    })
}

/// One record per variable over the pooled rows of every station.
///
/// Without a selection the variables are the union of every observed table's
/// columns, in order of first appearance. A station lacking a variable adds
/// missing values for its rows.
pub fn global_stats(
    evaluation: &Evaluation,
    variables: Option<&[&str]>,
) -> Result<StatisticsTable, EvalError> {
    let pairs = evaluation.pairs();
    let selected: Vec<String> = match variables {
        Some(variables) => variables.iter().map(|v| v.to_string()).collect(),
        None => {
            let mut union: Vec<String> = Vec::new();
            for pair in &pairs {
                for variable in pair.observed.variables() {
                    if !union.contains(&variable) {
                        union.push(variable);
                    }
                }
            }
            union
        }
    };

    let mut records = Vec::with_capacity(selected.len());
    for variable in selected {
        let mut sim = Vec::new();
        let mut obs = Vec::new();
        for pair in &pairs {
            let (s, o) = pair.series_or_missing(&variable)?;
            sim.extend(s);
            obs.extend(o);
        }
        records.push(variable_stats(&variable, &sim, &obs, None));
    }
    Ok(StatisticsTable {
        records,
        global: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::prepare_evaluation;
    use crate::types::station::StationCode;
    use crate::types::station_table::{StationTable, StationTables};
    use chrono::{NaiveDate, NaiveDateTime};
    use chrono_tz::UTC;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 6, 21)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn table(code: u32, name: &str, o3: Vec<Option<f64>>, wd: Vec<Option<f64>>) -> StationTable {
        let times: Vec<_> = (0..o3.len() as u32).map(at).collect();
        StationTable::from_columns(
            StationCode(code),
            name,
            UTC,
            &times,
            vec![("o3".to_string(), o3), ("wd".to_string(), wd)],
        )
        .unwrap()
    }

    fn evaluation(pairs: Vec<(StationTable, StationTable)>) -> Evaluation {
        let mut sim = StationTables::new();
        let mut obs = StationTables::new();
        for (s, o) in pairs {
            sim.insert(s.code(), s);
            obs.insert(o.code(), o);
        }
        prepare_evaluation(&sim, &obs, NaiveDate::from_ymd_opt(2018, 6, 21).unwrap()).unwrap()
    }

    #[test]
    fn test_end_to_end_two_rows() -> Result<(), Box<dyn std::error::Error>> {
        let eval = evaluation(vec![(
            table(99, "Pinheiros", vec![Some(10.0), Some(20.0)], vec![Some(350.0), Some(0.0)]),
            table(99, "Pinheiros", vec![Some(8.0), None], vec![Some(10.0), None]),
        )]);
        let stats = all_stations_stats(&eval, None, false)?;
        let o3 = stats.record("o3", Some("Pinheiros")).ok_or("missing o3")?;
        assert_eq!(o3.mb, 2.0);
        assert_eq!(o3.me, 2.0);
        assert_eq!(o3.rmse, Some(2.0));
        assert_eq!(o3.nmb, Some(25.0));
        assert_eq!(o3.nme, Some(25.0));
        assert_eq!(o3.om, Some(8.0));
        assert_eq!(o3.mm, Some(15.0));
        assert!(o3.ostd.is_some_and(f64::is_nan));

        let wd = stats.record("wd", Some("Pinheiros")).ok_or("missing wd")?;
        assert_eq!(wd.mb, -20.0);
        assert_eq!(wd.me, 20.0);
        assert_eq!(wd.rmse, None);
        Ok(())
    }

    #[test]
    fn test_global_pools_stations() -> Result<(), Box<dyn std::error::Error>> {
        let eval = evaluation(vec![
            (
                table(1, "A", vec![Some(10.0)], vec![None]),
                table(1, "A", vec![Some(8.0)], vec![None]),
            ),
            (
                table(2, "B", vec![Some(4.0)], vec![None]),
                table(2, "B", vec![Some(8.0)], vec![None]),
            ),
        ]);
        let stats = global_stats(&eval, Some(&["o3"]))?;
        assert!(stats.is_global());
        assert_eq!(stats.records().len(), 1);
        let o3 = &stats.records()[0];
        assert_eq!(o3.station, None);
        assert_eq!(o3.mb, -1.0);
        assert_eq!(o3.me, 3.0);
        assert_eq!(o3.nmb, Some(-12.5));
        Ok(())
    }

    #[test]
    fn test_global_over_stations_with_different_variables() -> Result<(), Box<dyn std::error::Error>>
    {
        let with = |code: u32, column: &str, sim: f64, obs: f64| {
            let build = |value: f64| {
                StationTable::from_columns(
                    StationCode(code),
                    format!("station {code}"),
                    UTC,
                    &[at(0)],
                    vec![
                        ("o3".to_string(), vec![Some(value)]),
                        (column.to_string(), vec![Some(value)]),
                    ],
                )
                .unwrap()
            };
            (build(sim), build(obs))
        };
        let eval = evaluation(vec![with(1, "co", 2.0, 1.0), with(2, "no2", 6.0, 3.0)]);

        let per_station = all_stations_stats(&eval, None, false)?;
        assert_eq!(per_station.variables(), vec!["o3", "co", "no2"]);

        let stats = global_stats(&eval, None)?;
        assert_eq!(stats.variables(), vec!["o3", "co", "no2"]);
        let o3 = stats.record("o3", None).ok_or("missing o3")?;
        assert_eq!(o3.mb, 2.0);
        let co = stats.record("co", None).ok_or("missing co")?;
        assert_eq!(co.mb, 1.0);
        assert_eq!(co.om, Some(1.0));
        let no2 = stats.record("no2", None).ok_or("missing no2")?;
        assert_eq!(no2.mb, 3.0);
        Ok(())
    }

    #[test]
    fn test_sorted_by_variable() -> Result<(), Box<dyn std::error::Error>> {
        let eval = evaluation(vec![
            (
                table(1, "A", vec![Some(1.0)], vec![Some(1.0)]),
                table(1, "A", vec![Some(1.0)], vec![Some(1.0)]),
            ),
            (
                table(2, "B", vec![Some(1.0)], vec![Some(1.0)]),
                table(2, "B", vec![Some(1.0)], vec![Some(1.0)]),
            ),
        ]);
        let stats = all_stations_stats(&eval, None, true)?;
        let order: Vec<_> = stats
            .records()
            .iter()
            .map(|r| (r.variable.as_str(), r.station.as_deref()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("o3", Some("A")),
                ("o3", Some("B")),
                ("wd", Some("A")),
                ("wd", Some("B"))
            ]
        );
        Ok(())
    }

    #[test]
    fn test_write_csv() -> Result<(), Box<dyn std::error::Error>> {
        let eval = evaluation(vec![(
            table(99, "Pinheiros", vec![Some(10.0), Some(20.0)], vec![Some(90.0), None]),
            table(99, "Pinheiros", vec![Some(8.0), Some(16.0)], vec![Some(80.0), None]),
        )]);
        let dir = tempfile::tempdir()?;

        let path = all_stations_stats(&eval, None, false)?.write_csv(dir.path())?;
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("o3_wd_stats.csv"));
        let text = std::fs::read_to_string(&path)?;
        assert_eq!(
            text.lines().next(),
            Some("pol,MB,ME,RMSE,NMB,NME,R,Om,Mm,Ostd,Mstd,aqs")
        );
        assert_eq!(text.lines().count(), 3);

        let path = global_stats(&eval, None)?.write_csv(dir.path())?;
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("o3_wd_global_stats.csv")
        );
        let text = std::fs::read_to_string(&path)?;
        assert!(!text.lines().next().unwrap_or_default().contains("aqs"));
        Ok(())
    }
}
