//! Error types for mapping-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mapping-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited-text error from the csv crate
    #[error("delimited text error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    /// No lines to build a table from
    #[error("no header line found in input")]
    EmptyInput,

    /// The header line has no leading row-identifier field
    #[error("header line is missing its first (row identifier) field")]
    MissingHeader,

    /// A data line does not have one field per header column
    #[error("line {line} has {found} fields, expected {expected} (one per header column)")]
    RowShape {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A column name that is not in the header
    #[error("'{name}' is not a valid column. Valid columns are: {}", .valid.join(", "))]
    UnknownColumn { name: String, valid: Vec<String> },

    /// Field delimiter that cannot be used for parsing
    #[error("invalid field delimiter {0:?}: must be a single ASCII character")]
    InvalidDelimiter(char),

    /// Invalid argument passed by a driver
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<csv::Error> for Error {
    fn from(source: csv::Error) -> Self {
        Error::Csv { source }
    }
}
