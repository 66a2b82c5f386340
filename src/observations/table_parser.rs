//! Parses the HTML results page of a QualAr export query.
//!
//! The page holds a `table#tbl` whose first two rows are headers. Each data
//! row, once empty cells are dropped, carries the day, hour, station name,
//! parameter name, units and value at positions 3, 4, 6, 7, 8 and 9.

use crate::observations::error::ObservationError;
use chrono::{Duration, NaiveDateTime};
use log::debug;
use scraper::{Html, Selector};

const HEADER_ROWS: usize = 2;
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y_%H:%M";

/// One hourly reading, stamped with local wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub local: NaiveDateTime,
    pub value: f64,
}

/// A data row of the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub day: String,
    pub hour: String,
    pub station_name: String,
    pub parameter_name: String,
    pub units: String,
    pub value: String,
}

impl ResultRow {
    fn from_cells(cells: &[String]) -> Option<Self> {
        let cell = |i: usize| cells.get(i).cloned();
        Some(Self {
            day: cell(3)?,
            hour: cell(4)?,
            station_name: cell(6)?,
            parameter_name: cell(7)?,
            units: cell(8)?,
            value: cell(9)?,
        })
    }

    /// `12 readings of O3 (Ozônio) [µg/m3] at Pinheiros`.
    pub fn describe(&self, count: usize) -> String {
        format!(
            "{} readings of {} [{}] at {}",
            count, self.parameter_name, self.units, self.station_name
        )
    }

    pub fn reading(&self) -> Result<Reading, ObservationError> {
        Ok(Reading {
            local: parse_timestamp(&self.day, &self.hour)?,
            value: parse_value(&self.value)?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ObservationError> {
    Selector::parse(css).map_err(|e| ObservationError::MalformedTable(e.to_string()))
}

/// Non-empty cell texts of every data row.
pub fn data_rows(html: &str) -> Result<Vec<Vec<String>>, ObservationError> {
    let document = Html::parse_document(html);
    let table_selector = selector("table#tbl")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or(ObservationError::ResultsTableNotFound)?;

    Ok(table
        .select(&row_selector)
        .skip(HEADER_ROWS)
        .map(|row| {
            row.select(&cell_selector)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .filter(|text| !text.is_empty())
                .collect()
        })
        .collect())
}

/// Readings of a results page. A page with at most one data row carries no
/// data.
pub fn parse_results_page(html: &str) -> Result<Vec<Reading>, ObservationError> {
    let rows = data_rows(html)?;
    if rows.len() <= 1 {
        debug!("Results page has {} data rows, treating as empty", rows.len());
        return Ok(Vec::new());
    }
    let mut readings = Vec::with_capacity(rows.len());
    let mut first: Option<ResultRow> = None;
    for cells in &rows {
        match ResultRow::from_cells(cells) {
            Some(row) => {
                readings.push(row.reading()?);
                first.get_or_insert(row);
            }
            None => debug!("Skipping results row with {} cells: {:?}", cells.len(), cells),
        }
    }
    if let Some(row) = first {
        debug!("{}", row.describe(readings.len()));
    }
    Ok(readings)
}

/// Parses a `dd/mm/yyyy` day and `HH:MM` hour. `24:00` is midnight of the
/// following day.
pub fn parse_timestamp(day: &str, hour: &str) -> Result<NaiveDateTime, ObservationError> {
    let (hour, next_day) = match hour.strip_prefix("24") {
        Some(minutes) => (format!("00{minutes}"), true),
        None => (hour.to_string(), false),
    };
    let text = format!("{day}_{hour}");
    let parsed = NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(|source| {
        ObservationError::DateParse {
            value: text.clone(),
            source,
        }
    })?;
    Ok(if next_day {
        parsed + Duration::days(1)
    } else {
        parsed
    })
}

/// Parses a value that uses `,` as decimal separator.
pub fn parse_value(value: &str) -> Result<f64, ObservationError> {
    let normalized = value.replace(',', ".");
    normalized
        .parse::<f64>()
        .map_err(|source| ObservationError::ValueParse {
            value: value.to_string(),
            source,
        })
}
