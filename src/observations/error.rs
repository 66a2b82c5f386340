use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Environment variable '{0}' with QualAr credentials is not set")]
    MissingCredential(&'static str),

    #[error("Results table not found in QualAr response")]
    ResultsTableNotFound,

    #[error("Malformed QualAr results table: {0}")]
    MalformedTable(String),

    #[error("Failed to parse observation timestamp '{value}'")]
    DateParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to parse observation value '{value}'")]
    ValueParse {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("Failed to read observation file '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Failed to read observation cache '{0}'")]
    CacheRead(PathBuf, #[source] PolarsError),

    #[error("Observation cache '{path}' is corrupt: {message}")]
    CacheDecode { path: PathBuf, message: String },

    #[error("Failed to encode observation cache '{0}'")]
    CacheEncode(PathBuf, #[source] PolarsError),

    #[error("Failed to write observation cache '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed building observation table: {0}")]
    Frame(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
