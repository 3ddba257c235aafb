use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::info;
use smsguard::{AppConfig, DemoServer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Interface to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8050)]
    port: u16,

    /// Path to the model artifact (defaults to $SMSGUARD_MODEL or models/sms_spam_model.json)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Refuse to load the artifact unless its SHA-256 matches
    #[arg(long)]
    model_sha256: Option<String>,

    /// Delay before the model is loaded, in milliseconds
    #[arg(long, default_value_t = 1000)]
    load_delay_ms: u64,

    /// Longest message accepted, in characters
    #[arg(long, default_value_t = smsguard::classifier::DEFAULT_MAX_INPUT_CHARS)]
    max_input_chars: usize,
}

impl Args {
    fn into_config(self) -> AppConfig {
        let defaults = AppConfig::default();
        AppConfig {
            host: self.host,
            port: self.port,
            model_path: self.model.unwrap_or(defaults.model_path.clone()),
            expected_sha256: self.model_sha256,
            load_delay: Duration::from_millis(self.load_delay_ms),
            max_input_chars: self.max_input_chars,
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    smsguard::init_logger();
    let config = Args::parse().into_config();

    info!("=== Starting {} ===", config.title);
    info!("Model artifact: {:?}", config.model_path);

    let server = DemoServer::bind(config).context("failed to start server")?;
    let shutdown = server.shutdown_handle();
    let mut serving = tokio::task::spawn_blocking(move || server.run());

    tokio::select! {
        result = &mut serving => {
            result.context("server thread panicked")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            shutdown.shutdown();
            serving.await.context("server thread panicked")?;
        }
    }

    info!("=== Demo stopped ===");
    Ok(())
}
