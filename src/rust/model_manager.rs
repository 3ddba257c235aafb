use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{
    LogisticModel, ModelArtifact, TextModel, ARTIFACT_FORMAT, ARTIFACT_VERSION,
};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid model artifact: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Incompatible model artifact: expected format '{expected}' v{expected_version}, found '{found}' v{found_version}")]
    Incompatible {
        expected: String,
        expected_version: u32,
        found: String,
        found_version: u32,
    },
    #[error("Invalid model parameters: {0}")]
    InvalidModel(String),
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
    #[error("Model already loaded")]
    AlreadyLoaded,
}

/// Where a loaded model came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub path: PathBuf,
    pub sha256: String,
    pub num_features: usize,
}

/// A model together with the metadata recorded when it was loaded.
#[derive(Debug)]
pub struct LoadedModel {
    pub model: Arc<dyn TextModel>,
    pub info: ModelInfo,
}

/// Shared, set-once reference to the active model.
///
/// Every clone points at the same slot. The slot starts empty, can be filled exactly
/// once, and is never replaced afterwards, so readers that observe a model keep
/// observing the same one.
#[derive(Debug, Clone, Default)]
pub struct ModelHandle {
    slot: Arc<OnceLock<LoadedModel>>,
}

impl ModelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&LoadedModel> {
        self.slot.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Installs a model. Fails with [`LoadError::AlreadyLoaded`] if one is already set.
    pub fn set(&self, model: Arc<dyn TextModel>, info: ModelInfo) -> Result<(), LoadError> {
        self.slot
            .set(LoadedModel { model, info })
            .map_err(|_| LoadError::AlreadyLoaded)
    }
}

/// What a call to [`ModelLoader::load_once`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The artifact was read and installed into the handle
    Loaded(ModelInfo),
    /// No artifact exists at the configured path; the handle stays unset
    Missing,
    /// A previous call already ran; nothing was done
    AlreadyAttempted,
}

#[derive(Deserialize)]
struct ArtifactHeader {
    format: String,
    version: u32,
}

/// Reads and validates a model artifact without touching any handle.
///
/// This is the `load(path) -> Model` half of the model contract. The
/// returned [`ModelInfo`] records the SHA-256 digest of the bytes that were parsed.
pub fn load_model<P: AsRef<Path>>(
    path: P,
    expected_sha256: Option<&str>,
) -> Result<(LogisticModel, ModelInfo), LoadError> {
    let path = path.as_ref();
    log::info!("Reading model artifact from {:?}", path);
    let bytes = fs::read(path)?;
    log::info!("Read {} bytes", bytes.len());

    let digest = sha256_hex(&bytes);
    log::info!("Model sha256: {}", digest);
    if let Some(expected) = expected_sha256 {
        if !expected.eq_ignore_ascii_case(&digest) {
            log::error!("Model hash mismatch: expected {}, got {}", expected, digest);
            return Err(LoadError::HashMismatch {
                expected: expected.to_string(),
                actual: digest,
            });
        }
    }

    let header: ArtifactHeader = serde_json::from_slice(&bytes)?;
    if header.format != ARTIFACT_FORMAT || header.version != ARTIFACT_VERSION {
        return Err(LoadError::Incompatible {
            expected: ARTIFACT_FORMAT.to_string(),
            expected_version: ARTIFACT_VERSION,
            found: header.format,
            found_version: header.version,
        });
    }

    let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
    let model = LogisticModel::try_from(artifact)
        .map_err(|e| LoadError::InvalidModel(e.to_string()))?;

    let info = ModelInfo {
        path: path.to_path_buf(),
        sha256: digest,
        num_features: model.num_features(),
    };
    Ok((model, info))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// One-shot loader that fills a [`ModelHandle`] from an artifact file.
#[derive(Debug)]
pub struct ModelLoader {
    path: PathBuf,
    expected_sha256: Option<String>,
    handle: ModelHandle,
    attempted: AtomicBool,
}

impl ModelLoader {
    pub fn new<P: AsRef<Path>>(path: P, handle: ModelHandle) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            expected_sha256: None,
            handle,
            attempted: AtomicBool::new(false),
        }
    }

    /// Requires the artifact bytes to hash to `sha256` (hex, case-insensitive)
    pub fn with_expected_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.expected_sha256 = Some(sha256.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// Loads the artifact into the handle the first time it is called.
    ///
    /// A missing artifact is not an error: the handle is left unset and
    /// [`LoadOutcome::Missing`] is returned. Unreadable, corrupt or incompatible
    /// artifacts return a [`LoadError`] and also leave the handle unset. Later calls
    /// return [`LoadOutcome::AlreadyAttempted`] without touching the file system.
    pub fn load_once(&self) -> Result<LoadOutcome, LoadError> {
        if self.attempted.swap(true, Ordering::SeqCst) {
            log::debug!("Model load already attempted, skipping");
            return Ok(LoadOutcome::AlreadyAttempted);
        }

        log::info!("Checking for model artifact:");
        log::info!("  Path: {:?} (exists: {})", self.path, self.path.exists());
        if !self.path.exists() {
            log::warn!("No model artifact found, classification is unavailable");
            return Ok(LoadOutcome::Missing);
        }

        let (model, info) = load_model(&self.path, self.expected_sha256.as_deref())
            .inspect_err(|e| log::error!("Failed to load model: {}", e))?;
        self.handle.set(Arc::new(model), info.clone())?;
        log::info!("Model loaded with {} features", info.num_features);
        Ok(LoadOutcome::Loaded(info))
    }
}
