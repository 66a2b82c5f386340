//! Hour-of-day means, the data behind diurnal profile plots.

use crate::evaluation::EvaluationPair;
use crate::types::station_table::StationTable;
use polars::prelude::*;

pub const HOUR_COL: &str = "hour";

const LOCAL_COL: &str = "local";

/// Mean of each variable per local hour (0-23) of the table's zone, sorted by
/// hour. Hours without rows are absent.
pub fn diurnal_profile(table: &StationTable, variables: &[&str]) -> PolarsResult<DataFrame> {
    let local: Vec<i64> = table
        .local_datetimes()?
        .iter()
        .map(|dt| dt.and_utc().timestamp_millis())
        .collect();
    let mut frame = table.frame().clone();
    frame.with_column(
        Series::new(LOCAL_COL.into(), local)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
    )?;

    let means: Vec<Expr> = variables.iter().map(|v| col(*v).mean()).collect();
    frame
        .lazy()
        .group_by([col(LOCAL_COL)
            .dt()
            .hour()
            .cast(DataType::Int32)
            .alias(HOUR_COL)])
        .agg(means)
        .sort([HOUR_COL], SortMultipleOptions::default())
        .collect()
}

/// Simulated and observed profiles of one variable side by side, as columns
/// `hour`, `sim`, `obs`.
pub fn paired_profile(pair: &EvaluationPair<'_>, variable: &str) -> PolarsResult<DataFrame> {
    let sim = diurnal_profile(pair.simulated, &[variable])?
        .lazy()
        .select([col(HOUR_COL), col(variable).alias("sim")]);
    let obs = diurnal_profile(pair.observed, &[variable])?
        .lazy()
        .select([col(HOUR_COL), col(variable).alias("obs")]);
    sim.left_join(obs, col(HOUR_COL), col(HOUR_COL))
        .sort([HOUR_COL], SortMultipleOptions::default())
        .collect()
}
