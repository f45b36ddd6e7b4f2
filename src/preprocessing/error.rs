//! Error types for preprocessing operations.

use std::fmt;

/// Error type for preprocessing and pipeline inference.
#[derive(Debug)]
pub enum PreprocessingError {
    /// A cell holds a value of the wrong kind for its column.
    TypeMismatch {
        column: String,
        expected: &'static str,
        got: String,
    },
    /// A category was not seen during fit and the encoder rejects unknowns.
    UnknownCategory { column: String, category: String },
    /// Numerical computation error (overflow, non-finite output, etc.).
    NumericalError(String),
    /// Invalid hyperparameter value.
    InvalidParameter(String),
    /// Serialization or deserialization error.
    SerializationError(String),
    /// I/O error during file operations.
    IoError(String),
    /// Empty data provided where non-empty was required.
    EmptyData(String),
    /// Feature dimension mismatch.
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
    /// Feature names differ from the ones seen during fit.
    FeatureNamesMismatch { expected: Vec<String>, got: Vec<String> },
}

impl fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessingError::TypeMismatch {
                column,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Type mismatch in column {}: expected {}, got {}",
                    column, expected, got
                )
            }
            PreprocessingError::UnknownCategory { column, category } => {
                write!(f, "Unknown category {:?} in column {}", category, column)
            }
            PreprocessingError::NumericalError(msg) => {
                write!(f, "Numerical error: {}", msg)
            }
            PreprocessingError::InvalidParameter(msg) => {
                write!(f, "Invalid parameter: {}", msg)
            }
            PreprocessingError::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            PreprocessingError::IoError(msg) => {
                write!(f, "I/O error: {}", msg)
            }
            PreprocessingError::EmptyData(msg) => {
                write!(f, "Empty data: {}", msg)
            }
            PreprocessingError::FeatureMismatch {
                expected_features,
                got_features,
            } => {
                write!(
                    f,
                    "Feature mismatch: expected {} features, got {}",
                    expected_features, got_features
                )
            }
            PreprocessingError::FeatureNamesMismatch { expected, got } => {
                let first_diff = expected
                    .iter()
                    .zip(got.iter())
                    .position(|(a, b)| a != b)
                    .unwrap_or(expected.len().min(got.len()));
                write!(
                    f,
                    "Feature names mismatch at position {}: expected {:?}, got {:?}",
                    first_diff,
                    expected.get(first_diff),
                    got.get(first_diff)
                )
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

impl From<std::io::Error> for PreprocessingError {
    fn from(err: std::io::Error) -> Self {
        PreprocessingError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for PreprocessingError {
    fn from(err: bincode::Error) -> Self {
        PreprocessingError::SerializationError(err.to_string())
    }
}
