use crate::utils::utc_to_local;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use std::fmt;

/// Inclusive calendar-date window used to query the observation source.
///
/// Dates are local to the monitoring network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window covering the first and last simulation step, with the UTC
    /// step times expressed as dates in `zone`.
    ///
    /// Returns `None` for an empty time coordinate.
    pub fn from_simulation_times(times: &[NaiveDateTime], zone: Tz) -> Option<Self> {
        let first = times.first()?;
        let last = times.last()?;
        Some(Self {
            start: utc_to_local(zone, first).date(),
            end: utc_to_local(zone, last).date(),
        })
    }

    /// Start date as the source expects it (`dd/mm/yyyy`).
    pub fn query_start(&self) -> String {
        self.start.format("%d/%m/%Y").to_string()
    }

    /// End date as the source expects it (`dd/mm/yyyy`).
    pub fn query_end(&self) -> String {
        self.end.format("%d/%m/%Y").to_string()
    }

    /// Cache label, `dd_mm_yyyy-dd_mm_yyyy`.
    pub fn cache_label(&self) -> String {
        format!(
            "{}-{}",
            self.start.format("%d_%m_%Y"),
            self.end.format("%d_%m_%Y")
        )
    }

    /// Local hourly steps spanning `[start 00:00, end + 1 day 00:00)`.
    pub fn hourly_steps(&self) -> Vec<NaiveDateTime> {
        let first = self.start.and_time(NaiveTime::MIN);
        let stop = (self.end + Duration::days(1)).and_time(NaiveTime::MIN);
        let mut steps = Vec::new();
        let mut current = first;
        while current < stop {
            steps.push(current);
            current += Duration::hours(1);
        }
        steps
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.query_start(), self.query_end())
    }
}
