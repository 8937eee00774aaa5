//! Error types for report generation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a report run.
///
/// All variants are fatal: the binary logs the error and exits non-zero.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to open, read, create or write a file.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path being accessed when the failure occurred.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input is not valid delimited text.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    /// A cell could not be converted to the column's type.
    #[error("invalid value in column '{column}' at line {line}: '{value}'")]
    InvalidValue {
        /// 1-based line number in the source file.
        line: u64,
        column: String,
        value: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Nothing left to plot.
    #[error("no data to plot for chart '{chart}'")]
    NoData { chart: String },

    /// The drawing backend failed.
    #[error("failed to render {}: {message}", path.display())]
    Render { path: PathBuf, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error is an I/O failure for a path that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message_names_column() {
        let err = ReportError::MissingColumn {
            column: "Config".to_string(),
        };
        assert_eq!(err.to_string(), "missing required column 'Config'");
    }

    #[test]
    fn test_is_not_found() {
        let err = ReportError::io(
            "results.csv",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("results.csv"));

        let err = ReportError::io(
            "results.csv",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(!err.is_not_found());
    }
}
