//! Error types for artifact loading and request-time prediction.

use crate::preprocessing::error::PreprocessingError;
use std::fmt;

/// Why a single prediction failed.
#[derive(Debug)]
pub enum InferenceFailure {
    /// The pipeline rejected the row.
    Pipeline(PreprocessingError),
    /// The pipeline returned NaN or an infinity.
    NonFinite(f64),
}

impl fmt::Display for InferenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceFailure::Pipeline(e) => write!(f, "{}", e),
            InferenceFailure::NonFinite(v) => write!(f, "model returned non-finite value {}", v),
        }
    }
}

impl std::error::Error for InferenceFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InferenceFailure::Pipeline(e) => Some(e),
            InferenceFailure::NonFinite(_) => None,
        }
    }
}

/// Error type for the serving layer.
#[derive(Debug)]
pub enum ServingError {
    /// No artifact locally and none could be fetched.
    ArtifactUnavailable(String),
    /// Artifact bytes do not decode into a usable pipeline.
    ArtifactCorrupt(String),
    /// The pipeline does not expose its input column names.
    SchemaExtraction(String),
    /// The process started without a model.
    ModelNotLoaded,
    /// The pipeline failed on a request.
    Inference(InferenceFailure),
}

impl fmt::Display for ServingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServingError::ArtifactUnavailable(msg) => write!(f, "Model artifact unavailable: {}", msg),
            ServingError::ArtifactCorrupt(msg) => write!(f, "Model artifact corrupt: {}", msg),
            ServingError::SchemaExtraction(msg) => {
                write!(f, "Could not extract feature names: {}", msg)
            }
            ServingError::ModelNotLoaded => write!(f, "Model not loaded"),
            ServingError::Inference(e) => write!(f, "Inference failed: {}", e),
        }
    }
}

impl std::error::Error for ServingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServingError::Inference(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InferenceFailure> for ServingError {
    fn from(err: InferenceFailure) -> Self {
        ServingError::Inference(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_inference_error_keeps_source_chain() {
        let err = ServingError::from(InferenceFailure::Pipeline(
            PreprocessingError::NumericalError("overflow".to_string()),
        ));
        let failure = err.source().unwrap();
        let root = failure.source().unwrap();
        assert!(root.to_string().contains("overflow"));
        assert!(err.to_string().starts_with("Inference failed"));
    }

    #[test]
    fn test_model_not_loaded_display() {
        assert_eq!(ServingError::ModelNotLoaded.to_string(), "Model not loaded");
        assert!(ServingError::ModelNotLoaded.source().is_none());
    }

    #[test]
    fn test_non_finite_display() {
        let err = InferenceFailure::NonFinite(f64::INFINITY);
        assert!(err.to_string().contains("inf"));
    }
}
