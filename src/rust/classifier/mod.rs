mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
pub mod features;
mod model;
mod utils;

pub use builder::ModelBuilder;
pub use classifier::{
    ClassificationResult, Classifier, DEFAULT_MAX_INPUT_CHARS, LABELS, SPAM_INDEX,
};
pub use error::{ClassifierError, ErrorKind};
pub use model::{
    LogisticModel, ModelArtifact, TextModel, ARTIFACT_FORMAT, ARTIFACT_VERSION, NUM_CLASSES,
};
pub use utils::format_percent;
