use std::collections::HashMap;

use log::debug;

use super::error::ClassifierError;
use super::features::is_extractable;
use super::model::LogisticModel;

/// A builder for constructing a [`LogisticModel`] in code with a fluent interface.
///
/// Models normally come from an artifact file on disk, but tests, benchmarks and
/// embedding applications can assemble one directly.
///
/// # Example
/// ```
/// use smsguard::{ModelBuilder, TextModel};
///
/// let model = ModelBuilder::new()
///     .with_bias(-1.0)
///     .add_feature("prize", 2.5).unwrap()
///     .add_feature("meeting", -1.5).unwrap()
///     .build()
///     .unwrap();
///
/// let probs = model.predict_proba(&["claim your prize"]).unwrap();
/// assert!(probs[[0, 1]] > 0.5);
/// ```
#[derive(Default, Debug)]
pub struct ModelBuilder {
    bias: f32,
    weights: HashMap<String, f32>,
}

impl ModelBuilder {
    /// Creates an empty builder with a zero bias
    pub fn new() -> Self {
        Self {
            bias: 0.0,
            weights: HashMap::new(),
        }
    }

    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = bias;
        self
    }

    /// Validates feature data according to the following rules:
    /// - Name must not be empty
    /// - Name must not exceed 64 characters
    /// - Weight must be finite
    fn validate_feature(name: &str, weight: f32) -> Result<(), ClassifierError> {
        const MAX_FEATURE_LENGTH: usize = 64;

        if name.is_empty() {
            return Err(ClassifierError::ValidationError("Feature name cannot be empty".into()));
        }
        if name.chars().count() > MAX_FEATURE_LENGTH {
            return Err(ClassifierError::ValidationError(format!(
                "Feature name is too long ({} chars, max is {})",
                name.chars().count(),
                MAX_FEATURE_LENGTH
            )));
        }
        if !is_extractable(name) {
            return Err(ClassifierError::ValidationError(format!(
                "Feature '{}' is not a single word or shape token",
                name
            )));
        }
        if !weight.is_finite() {
            return Err(ClassifierError::ValidationError(format!(
                "Weight for feature '{}' must be finite",
                name
            )));
        }
        Ok(())
    }

    /// Adds a weighted feature. Word features are matched lowercased, so the
    /// name is lowercased here as well; shape tokens such as `<phone>` are unaffected.
    ///
    /// # Errors
    /// - `ValidationError` if the name is empty or too long, or the weight is not finite
    /// - `ValidationError` if the feature was already added
    pub fn add_feature(mut self, name: impl Into<String>, weight: f32) -> Result<Self, ClassifierError> {
        let name = name.into().to_lowercase();
        Self::validate_feature(&name, weight)?;

        if self.weights.contains_key(&name) {
            return Err(ClassifierError::ValidationError(format!(
                "Feature '{}' already added",
                name
            )));
        }

        self.weights.insert(name, weight);
        Ok(self)
    }

    /// Adds several features at once, stopping at the first invalid one.
    pub fn add_features<I, S>(self, features: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        features
            .into_iter()
            .try_fold(self, |builder, (name, weight)| builder.add_feature(name, weight))
    }

    /// Builds and returns the final model
    ///
    /// # Errors
    /// - `ModelError` if the bias is not finite
    /// - `ValidationError` if no features were added
    pub fn build(self) -> Result<LogisticModel, ClassifierError> {
        if self.weights.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Model must have at least one feature".into(),
            ));
        }
        debug!("Building logistic model with {} features", self.weights.len());
        LogisticModel::new(self.bias, self.weights)
    }
}
