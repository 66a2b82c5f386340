//! Spin-up trimming and alignment of observed tables onto the simulated
//! index.

use crate::error::EvalError;
use crate::types::station::StationCode;
use crate::types::station_table::{StationTable, StationTables};
use crate::utils::local_to_utc;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use log::{debug, info};
use polars::prelude::{PolarsError, PolarsResult};

/// UTC instant of the first local hour of `date` in `zone`, normally midnight.
/// When a DST change skips midnight the first hour that exists is used.
pub fn spin_up_cutoff(date: NaiveDate, zone: Tz) -> NaiveDateTime {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..24)
        .find_map(|h| local_to_utc(zone, &(midnight + Duration::hours(h))))
        .unwrap_or(midnight)
}

/// Simulated and observed tables ready for statistics.
///
/// Every observed table has exactly the rows of the simulated table of the
/// same station.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub simulated: StationTables,
    pub observed: StationTables,
}

/// Simulated and observed series of one station on a shared index.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationPair<'a> {
    pub code: StationCode,
    pub simulated: &'a StationTable,
    pub observed: &'a StationTable,
}

fn check_lengths(
    code: StationCode,
    simulated: &[Option<f64>],
    observed: &[Option<f64>],
) -> PolarsResult<()> {
    if simulated.len() != observed.len() {
        return Err(PolarsError::ShapeMismatch(
            format!(
                "station {}: {} simulated rows but {} observed rows",
                code,
                simulated.len(),
                observed.len()
            )
            .into(),
        ));
    }
    Ok(())
}

impl EvaluationPair<'_> {
    pub fn name(&self) -> &str {
        self.simulated.name()
    }

    /// (simulated, observed) values of a variable present in both tables.
    ///
    /// Fails unless both tables have the same number of rows.
    pub fn series(&self, variable: &str) -> PolarsResult<(Vec<Option<f64>>, Vec<Option<f64>>)> {
        let simulated = self.simulated.values(variable)?;
        let observed = self.observed.values(variable)?;
        check_lengths(self.code, &simulated, &observed)?;
        Ok((simulated, observed))
    }

    /// Like [`EvaluationPair::series`], but a table without the variable
    /// contributes missing values for each of its rows.
    pub fn series_or_missing(
        &self,
        variable: &str,
    ) -> PolarsResult<(Vec<Option<f64>>, Vec<Option<f64>>)> {
        let values = |table: &StationTable| {
            if table.has_variable(variable) {
                table.values(variable)
            } else {
                Ok(vec![None; table.height()])
            }
        };
        let simulated = values(self.simulated)?;
        let observed = values(self.observed)?;
        check_lengths(self.code, &simulated, &observed)?;
        Ok((simulated, observed))
    }

    /// Variables present in both tables, in simulated-table order.
    pub fn shared_variables(&self) -> Vec<String> {
        self.simulated
            .variables()
            .into_iter()
            .filter(|v| self.observed.has_variable(v))
            .collect()
    }
}

impl Evaluation {
    /// Pairs for every observed station.
    pub fn pairs(&self) -> Vec<EvaluationPair<'_>> {
        self.observed
            .iter()
            .filter_map(|(code, observed)| {
                self.simulated.get(code).map(|simulated| EvaluationPair {
                    code: *code,
                    simulated,
                    observed,
                })
            })
            .collect()
    }
}

/// Drops simulated rows before local midnight of `spin_up_end` and reindexes
/// each observed table onto its station's remaining simulated timestamps.
///
/// Every observed station needs a simulated table.
pub fn prepare_evaluation(
    simulated: &StationTables,
    observed: &StationTables,
    spin_up_end: NaiveDate,
) -> Result<Evaluation, EvalError> {
    let mut trimmed = StationTables::new();
    for (code, table) in simulated {
        let cutoff = spin_up_cutoff(spin_up_end, table.zone());
        let kept = table.since(cutoff)?;
        debug!(
            "Station {}: kept {} of {} simulated rows from {} UTC",
            code,
            kept.height(),
            table.height(),
            cutoff
        );
        trimmed.insert(*code, kept);
    }

    let mut aligned = StationTables::new();
    for (code, table) in observed {
        let index = trimmed
            .get(code)
            .ok_or(EvalError::MissingSimulatedStation(*code))?;
        aligned.insert(*code, table.aligned_to(index)?);
    }
    info!(
        "Prepared {} stations for evaluation after spin-up ending {}",
        aligned.len(),
        spin_up_end
    );

    Ok(Evaluation {
        simulated: trimmed,
        observed: aligned,
    })
}
