use std::fmt;

/// Represents the different types of errors that can occur while classifying a message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// The input was empty, absent or too long. The model was not consulted.
    ValidationError(String),
    /// No model has been loaded into the handle yet
    ModelNotLoaded,
    /// The model was consulted but did not produce a usable probability row
    PredictionError(String),
    /// A model could not be constructed from the supplied parameters
    ModelError(String),
}

/// Coarse grouping of [`ClassifierError`] used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Inference,
}

impl ClassifierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::ModelNotLoaded | Self::PredictionError(_) | Self::ModelError(_) => {
                ErrorKind::Inference
            }
        }
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "{}", msg),
            Self::ModelNotLoaded => write!(f, "model is not loaded"),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Inference => "inference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ClassifierError::ValidationError("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(ClassifierError::ModelNotLoaded.kind(), ErrorKind::Inference);
        assert_eq!(ClassifierError::PredictionError("nan".into()).kind(), ErrorKind::Inference);
    }

    #[test]
    fn test_display() {
        assert_eq!(ClassifierError::ModelNotLoaded.to_string(), "model is not loaded");
        assert_eq!(
            ClassifierError::ValidationError("Please enter a message to classify".into()).to_string(),
            "Please enter a message to classify"
        );
    }
}
