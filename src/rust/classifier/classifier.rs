use log::debug;
use serde::Serialize;

use super::error::ClassifierError;
use super::model::NUM_CLASSES;
use super::utils::{argmax, format_percent};
use crate::model_manager::ModelHandle;

/// Display names of the two classes, indexed like the model's probability columns.
pub const LABELS: [&str; NUM_CLASSES] = ["Ham", "Spam"];

/// Index of the flagged class in [`LABELS`] and in every probability row.
pub const SPAM_INDEX: usize = 1;

/// Default upper bound on message length, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;

const EMPTY_INPUT_MESSAGE: &str = "Please enter a message to classify";

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label: &'static str,
    pub confidence: f32,
    pub is_spam: bool,
}

impl ClassificationResult {
    /// Confidence as a percentage with two decimals, e.g. `97.53%`
    pub fn confidence_text(&self) -> String {
        format_percent(self.confidence)
    }
}

/// Handles classify requests against whatever model the shared handle holds.
///
/// The classifier only ever reads the handle, so it can be created before any model is
/// loaded and will start succeeding as soon as the loader fills the slot.
///
/// ```
/// use smsguard::{Classifier, ClassifierError, ModelHandle};
///
/// let classifier = Classifier::new(ModelHandle::new());
/// assert_eq!(classifier.classify(Some("hello")), Err(ClassifierError::ModelNotLoaded));
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    handle: ModelHandle,
    max_input_chars: usize,
}

impl Classifier {
    pub fn new(handle: ModelHandle) -> Self {
        Self {
            handle,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// Classifies a single message.
    ///
    /// # Errors
    /// - `ValidationError` if `text` is absent, empty or longer than the configured limit;
    ///   the model is not consulted in that case
    /// - `ModelNotLoaded` if the handle is still unset
    /// - `PredictionError` if the model fails or returns an unusable probability row
    pub fn classify(&self, text: Option<&str>) -> Result<ClassificationResult, ClassifierError> {
        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => return Err(ClassifierError::ValidationError(EMPTY_INPUT_MESSAGE.into())),
        };

        let len = text.chars().count();
        if len > self.max_input_chars {
            return Err(ClassifierError::ValidationError(format!(
                "Message is too long ({} characters, max is {})",
                len, self.max_input_chars
            )));
        }

        let loaded = self.handle.get().ok_or(ClassifierError::ModelNotLoaded)?;
        let probs = loaded.model.predict_proba(&[text])?;

        if probs.shape() != [1, NUM_CLASSES] {
            return Err(ClassifierError::PredictionError(format!(
                "expected probabilities shaped [1, {}], got {:?}",
                NUM_CLASSES,
                probs.shape()
            )));
        }
        let row = probs.row(0);
        if row.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0) {
            return Err(ClassifierError::PredictionError(format!(
                "probabilities out of range: {}",
                row
            )));
        }

        let best = argmax(row)
            .ok_or_else(|| ClassifierError::PredictionError("empty probability row".into()))?;
        debug!("Probabilities {} -> class {}", row, best);

        Ok(ClassificationResult {
            label: LABELS[best],
            confidence: row[best],
            is_spam: best == SPAM_INDEX,
        })
    }
}
