use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("Field '{0}' is not available from the simulation output")]
    MissingField(String),

    #[error("Field '{name}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Field '{name}' has {found} dimensions, expected {expected}")]
    Dimensionality {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("Field '{name}' has {found} time steps, expected {expected}")]
    TimeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Grid cell (x={x}, y={y}) is outside field '{name}'")]
    OutOfGrid { name: String, x: usize, y: usize },

    #[error("No simulated fields were requested")]
    NoFields,

    #[error("Failed building station table: {0}")]
    Frame(#[from] PolarsError),
}
