use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::classifier::DEFAULT_MAX_INPUT_CHARS;

/// Environment variable that overrides the default artifact location.
pub const MODEL_PATH_ENV: &str = "SMSGUARD_MODEL";

/// Artifact location used when neither the CLI nor the environment names one.
pub const DEFAULT_MODEL_PATH: &str = "models/sms_spam_model.json";

pub const DEFAULT_TITLE: &str = "SMS Spam Classifier Demo";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Shown in the browser tab
    pub title: String,
    pub model_path: PathBuf,
    /// Hex SHA-256 the artifact must match, if set
    pub expected_sha256: Option<String>,
    /// Delay between the server accepting connections and the model load firing
    pub load_delay: Duration,
    pub max_input_chars: usize,
    pub max_body_bytes: usize,
    /// Upper bound on how long the request loop blocks before rechecking shutdown
    pub poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
            title: DEFAULT_TITLE.to_string(),
            model_path: Self::default_model_path(),
            expected_sha256: None,
            load_delay: Duration::from_millis(1000),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            max_body_bytes: 64 * 1024,
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl AppConfig {
    /// Returns the default artifact path
    pub fn default_model_path() -> PathBuf {
        Self::default_model_path_from(env::var(MODEL_PATH_ENV).ok())
    }

    /// Resolves the artifact path from the value of `SMSGUARD_MODEL`, if any.
    pub(crate) fn default_model_path_from(env_value: Option<String>) -> PathBuf {
        // 1. Non-empty environment value wins
        if let Some(path) = env_value.filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }

        // 2. Fall back to the artifact shipped next to the binary's working directory
        PathBuf::from(DEFAULT_MODEL_PATH)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
