//! Error type shared by the readers and writers.

use std::{io, path::PathBuf};

use graphscan_core::{DataSourceError, GraphError};
use thiserror::Error;

/// Errors raised while reading or writing graphscan text formats.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CsvProviderError {
    /// Opening, reading, creating, or writing a file failed.
    #[error("i/o error on `{}`: {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying operating-system error.
        #[source]
        source: io::Error,
    },
    /// A line could not be parsed.
    #[error("{}:{line}: {reason}", .path.display())]
    MalformedRecord {
        /// File containing the record.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong with the record.
        reason: String,
    },
    /// The dataset held no records.
    #[error("`{}` contains no records", .path.display())]
    EmptyInput {
        /// File that was empty.
        path: PathBuf,
    },
    /// The edges did not form a valid graph over the dataset.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The records did not form a valid point store.
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

/// Stable codes describing [`CsvProviderError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum CsvProviderErrorCode {
    /// File access failed.
    Io,
    /// A line could not be parsed.
    MalformedRecord,
    /// The dataset held no records.
    EmptyInput,
    /// The edges did not form a valid graph.
    Graph,
    /// The records did not form a valid point store.
    DataSource,
}

impl CsvProviderErrorCode {
    /// Return the stable machine-readable representation of this error code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "CSV_IO",
            Self::MalformedRecord => "CSV_MALFORMED_RECORD",
            Self::EmptyInput => "CSV_EMPTY_INPUT",
            Self::Graph => "CSV_GRAPH",
            Self::DataSource => "CSV_DATA_SOURCE",
        }
    }
}

impl std::fmt::Display for CsvProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CsvProviderError {
    /// Retrieve the stable [`CsvProviderErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> CsvProviderErrorCode {
        match self {
            Self::Io { .. } => CsvProviderErrorCode::Io,
            Self::MalformedRecord { .. } => CsvProviderErrorCode::MalformedRecord,
            Self::EmptyInput { .. } => CsvProviderErrorCode::EmptyInput,
            Self::Graph(_) => CsvProviderErrorCode::Graph,
            Self::DataSource(_) => CsvProviderErrorCode::DataSource,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}
