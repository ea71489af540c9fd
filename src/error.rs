//! Error types for the column store

use thiserror::Error;

use crate::model::TypeTag;

/// Result type alias used throughout the library
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by dataset, filter, CSV and streaming operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// No column with this name exists
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A column with this name already exists
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Column or row length disagrees with the dataset row count
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Requested or supplied type does not match the stored column type
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// CSV input has no header line
    #[error("CSV input is empty")]
    EmptyFile,

    /// Malformed CSV structure
    #[error("Invalid format at line {line}: {message}")]
    InvalidFormat { line: u64, message: String },

    /// Row index or range out of bounds
    #[error("Invalid index {index} (length {len})")]
    InvalidIndex { index: usize, len: usize },

    /// Operation is not defined for this column type
    #[error("Unsupported operation {op} for type {tag}")]
    UnsupportedType { op: String, tag: TypeTag },

    /// Text could not be parsed into the column's type
    #[error("Cannot parse {value:?} as {expected} for column {column}")]
    Parse {
        column: String,
        value: String,
        expected: TypeTag,
    },

    /// The chunk source was disposed and cannot be read
    #[error("Chunk source has been disposed")]
    SourceDisposed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl StoreError {
    pub(crate) fn type_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        StoreError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn unsupported(op: impl ToString, tag: TypeTag) -> Self {
        StoreError::UnsupportedType {
            op: op.to_string(),
            tag,
        }
    }
}
