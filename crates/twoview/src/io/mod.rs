//! Reading and writing correspondences and results.

/// CSV tables of correspondences and point triplets.
pub mod table;

/// JSON export of estimation results.
pub mod json;

/// Error types for the io module.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Error reading or writing file
    #[error("error reading or writing file")]
    IoError(#[from] std::io::Error),

    /// Unexpected header line
    #[error("Unexpected header {found:?}, expected {expected:?}")]
    InvalidHeader {
        /// Header the table must start with.
        expected: &'static str,
        /// Header found in the file.
        found: String,
    },

    /// Parse error
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Error building a correspondence set or triplets
    #[error(transparent)]
    Geometry(#[from] crate::error::TwoViewError),

    /// Error encoding JSON
    #[error("error encoding json")]
    Json(#[from] serde_json::Error),
}
