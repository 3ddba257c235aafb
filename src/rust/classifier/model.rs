use std::collections::HashMap;
use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::features::{extract_features, is_extractable};
use super::utils::sigmoid;

/// Value of the `format` field every artifact must carry.
pub const ARTIFACT_FORMAT: &str = "smsguard-logistic";
/// The only artifact version this build understands.
pub const ARTIFACT_VERSION: u32 = 1;

/// Number of columns in every probability row: `[ham, spam]`.
pub const NUM_CLASSES: usize = 2;

/// A pretrained binary text model.
///
/// Implementations receive a batch of messages and return one probability row per
/// message, shaped `[batch_size, 2]`, where column 0 is the benign class and column 1
/// the flagged class.
pub trait TextModel: Send + Sync + fmt::Debug {
    fn predict_proba(&self, batch: &[&str]) -> Result<Array2<f32>, ClassifierError>;

    /// Number of scored features, reported in [`crate::ModelInfo`].
    fn num_features(&self) -> usize;
}

/// On-disk representation of a [`LogisticModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelArtifact {
    pub format: String,
    pub version: u32,
    pub bias: f32,
    pub weights: HashMap<String, f32>,
}

/// Logistic regression over the sparse binary features produced by
/// [`extract_features`](super::features::extract_features).
#[derive(Debug, Clone)]
pub struct LogisticModel {
    bias: f32,
    weights: HashMap<String, f32>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<LogisticModel>();
    }
};

impl LogisticModel {
    /// Builds a model after checking that every parameter is usable.
    pub fn new(bias: f32, weights: HashMap<String, f32>) -> Result<Self, ClassifierError> {
        if !bias.is_finite() {
            return Err(ClassifierError::ModelError(format!("bias is not finite: {}", bias)));
        }
        if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(ClassifierError::ModelError(format!(
                "weight for feature '{}' is not finite: {}",
                name, w
            )));
        }
        if let Some(name) = weights.keys().find(|name| !is_extractable(name)) {
            return Err(ClassifierError::ModelError(format!(
                "feature '{}' can never be extracted from a message",
                name
            )));
        }
        Ok(Self { bias, weights })
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn weight(&self, feature: &str) -> Option<f32> {
        self.weights.get(feature).copied()
    }

    /// Raw logit for a single message.
    pub fn score(&self, text: &str) -> f32 {
        extract_features(text)
            .iter()
            .filter_map(|f| self.weights.get(f))
            .fold(self.bias, |acc, w| acc + w)
    }

    pub fn to_artifact(&self) -> ModelArtifact {
        ModelArtifact {
            format: ARTIFACT_FORMAT.to_string(),
            version: ARTIFACT_VERSION,
            bias: self.bias,
            weights: self.weights.clone(),
        }
    }
}

impl TryFrom<ModelArtifact> for LogisticModel {
    type Error = ClassifierError;

    fn try_from(artifact: ModelArtifact) -> Result<Self, Self::Error> {
        LogisticModel::new(artifact.bias, artifact.weights)
    }
}

impl TextModel for LogisticModel {
    fn predict_proba(&self, batch: &[&str]) -> Result<Array2<f32>, ClassifierError> {
        let mut probs = Array2::zeros((batch.len(), NUM_CLASSES));
        for (i, text) in batch.iter().enumerate() {
            let p_spam = sigmoid(self.score(text));
            probs[[i, 0]] = 1.0 - p_spam;
            probs[[i, 1]] = p_spam;
        }
        Ok(probs)
    }

    fn num_features(&self) -> usize {
        self.weights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(pairs: &[(&str, f32)]) -> HashMap<String, f32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_rows_sum_to_one() {
        let model = LogisticModel::new(-1.0, weights(&[("prize", 3.0)])).unwrap();
        let probs = model.predict_proba(&["win a prize", "see you soon"]).unwrap();
        assert_eq!(probs.shape(), &[2, NUM_CLASSES]);
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-6);
        }
        assert!(probs[[0, 1]] > probs[[0, 0]]);
        assert!(probs[[1, 0]] > probs[[1, 1]]);
    }

    #[test]
    fn test_score_uses_feature_set() {
        let model = LogisticModel::new(0.5, weights(&[("prize", 1.0)])).unwrap();
        assert!((model.score("prize prize prize") - 1.5).abs() < 1e-6);
        assert!((model.score("nothing here") - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_finite_parameters() {
        assert!(LogisticModel::new(f32::NAN, HashMap::new()).is_err());
        assert!(LogisticModel::new(0.0, weights(&[("x", f32::INFINITY)])).is_err());
        assert!(LogisticModel::new(0.0, weights(&[("", 1.0)])).is_err());
    }

    #[test]
    fn test_rejects_unmatchable_feature_names() {
        for name in ["WINNER", "free prize", "t&c", "12345"] {
            let result = LogisticModel::new(0.0, weights(&[(name, 1.0)]));
            assert!(matches!(result, Err(ClassifierError::ModelError(_))), "{}", name);
        }
        assert!(LogisticModel::new(0.0, weights(&[("<phone>", 1.0), ("3pm", 0.5)])).is_ok());
    }

    #[test]
    fn test_artifact_conversion() {
        let model = LogisticModel::new(-0.25, weights(&[("call", 1.25)])).unwrap();
        let artifact = model.to_artifact();
        assert_eq!(artifact.format, ARTIFACT_FORMAT);
        assert_eq!(artifact.version, ARTIFACT_VERSION);

        let restored = LogisticModel::try_from(artifact).unwrap();
        assert_eq!(restored.bias(), -0.25);
        assert_eq!(restored.weight("call"), Some(1.25));
    }
}
