//! A small web demo that flags SMS spam with a pretrained logistic text classifier.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use smsguard::{Classifier, ModelBuilder, ModelHandle, ModelInfo};
//!
//! let model = ModelBuilder::new()
//!     .with_bias(-1.5)
//!     .add_feature("prize", 2.5)?
//!     .add_feature("<phone>", 2.0)?
//!     .add_feature("meeting", -1.2)?
//!     .build()?;
//!
//! let handle = ModelHandle::new();
//! let info = ModelInfo { path: "in-memory".into(), sha256: String::new(), num_features: 3 };
//! handle.set(Arc::new(model), info)?;
//!
//! let classifier = Classifier::new(handle);
//! let result = classifier.classify(Some("Claim your prize now: 07700900123"))?;
//! println!("{} ({})", result.label, result.confidence_text());
//! # Ok(())
//! # }
//! ```
//!
//! # Loading an artifact
//!
//! In the server the handle is filled by a [`ModelLoader`] once the startup trigger
//! fires. A missing artifact is not an error; the handle simply stays unset and
//! every classification reports [`ClassifierError::ModelNotLoaded`].
//!
//! ```rust
//! use smsguard::{Classifier, LoadOutcome, ModelHandle, ModelLoader};
//!
//! let handle = ModelHandle::new();
//! let loader = ModelLoader::new("does/not/exist.json", handle.clone());
//! assert_eq!(loader.load_once().unwrap(), LoadOutcome::Missing);
//! assert!(Classifier::new(handle).classify(Some("hello")).is_err());
//! ```

pub mod classifier;
pub mod config;
pub mod model_manager;
pub mod server;
pub mod ui;

pub use classifier::{
    ClassificationResult, Classifier, ClassifierError, ErrorKind, LogisticModel, ModelArtifact,
    ModelBuilder, TextModel, LABELS,
};
pub use config::AppConfig;
pub use model_manager::{load_model, LoadError, LoadOutcome, LoadedModel, ModelHandle, ModelInfo, ModelLoader};
pub use server::{DemoServer, ServerError, ShutdownHandle, StartupTrigger};
pub use ui::{DisplayMessage, Style};

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
