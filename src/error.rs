//! Errors raised by the filter and merge stages.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The file has no header row to take column names from.
    #[error("{}: no columns to parse from file", .0.display())]
    NoColumns(PathBuf),

    #[error("{}: expected {expected} fields in line {line}, saw {found}", .path.display())]
    RowWidth {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("{}: no data rows", .0.display())]
    EmptyTable(PathBuf),

    #[error("time data {value:?} does not match format {format:?}")]
    Timestamp { value: String, format: &'static str },
}

impl MergeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MergeError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        MergeError::Csv {
            path: path.into(),
            source,
        }
    }
}
