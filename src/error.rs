//! Error types for sheetreport

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for sheetreport operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Main error type for export, read-back, search and file operations
#[derive(Error, Debug)]
pub enum ReportError {
    /// Write, permission or disk failure on a named path
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data row does not have one value per header column
    #[error("Row {row} has {found} values but the header has {expected} columns")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Sheet name rejected by the workbook format
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Color is not a 6- or 8-digit hex RGB value
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Cell range could not be parsed or is inverted
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Error occurred while reading a workbook back
    #[error("Failed to read workbook: {0}")]
    Read(String),

    /// ZIP container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Search API returned status {0}")]
    HttpStatus(u16),

    /// Response body was not the expected JSON
    #[error("Failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True for failures caused by caller input rather than the environment
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ReportError::RowLength { .. }
                | ReportError::InvalidSheetName(_)
                | ReportError::InvalidColor(_)
                | ReportError::InvalidRange(_)
        )
    }
}

/// Attach a path to bare `std::io::Error`s
pub(crate) trait IoResultExt<T> {
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| ReportError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err = ReportError::io(
            "/no/such/dir/out.xlsx",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/no/such/dir/out.xlsx"));
        assert!(msg.contains("denied"));
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_row_length_is_invalid_input() {
        let err = ReportError::RowLength {
            row: 3,
            expected: 5,
            found: 4,
        };
        assert!(err.is_invalid_input());
        assert_eq!(
            err.to_string(),
            "Row 3 has 4 values but the header has 5 columns"
        );
    }
}
