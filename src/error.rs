//! Error types for the timesheet pipeline.
//!
//! Only schema problems and I/O surface as errors. Bad cells, odd work
//! types and stale filter values are absorbed where they occur.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Required canonical columns still absent after alias resolution.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    #[error("input has no header row")]
    EmptyInput,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}
