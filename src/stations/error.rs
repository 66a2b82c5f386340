use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StationError {
    #[error("Failed to read station catalog '{0}'")]
    CatalogRead(PathBuf, #[source] PolarsError),

    #[error("Station catalog '{path}' has no usable '{column}' column")]
    MissingColumn {
        path: PathBuf,
        column: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("Station catalog '{path}' has an invalid '{column}' value in row {row}")]
    InvalidValue {
        path: PathBuf,
        column: &'static str,
        row: usize,
    },
}
