use crate::fields::error::FieldError;
use crate::observations::error::ObservationError;
use crate::stations::error::StationError;
use crate::types::station::StationCode;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Station(#[from] StationError),

    #[error(transparent)]
    Observation(#[from] ObservationError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Observed station {0} has no simulated counterpart")]
    MissingSimulatedStation(StationCode),

    #[error("Failed to create output file '{0}'")]
    OutputCreate(PathBuf, #[source] std::io::Error),

    #[error("Failed to write CSV file '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution,
}
