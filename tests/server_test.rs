use serde_json::{json, Value};
use smsguard::{AppConfig, DemoServer, ShutdownHandle};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const SPAM_MESSAGE: &str = "WINNER!! ... Call this number immediately: +1234567890";

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start(model_path: PathBuf, load_delay: Duration) -> Self {
        let config = AppConfig {
            port: 0,
            model_path,
            load_delay,
            poll_interval: Duration::from_millis(20),
            max_body_bytes: 1024,
            ..AppConfig::default()
        };
        let server = DemoServer::bind(config).expect("Failed to bind test server");
        let addr = server.local_addr().expect("Server has no IP address");
        let shutdown = server.shutdown_handle();
        let thread = thread::spawn(move || server.run());
        Self { addr, shutdown, thread: Some(thread) }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn shipped_model_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models/sms_spam_model.json")
}

#[tokio::test]
async fn test_index_page() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start(shipped_model_path(), Duration::ZERO);
    let response = reqwest::get(server.url("/")).await?;

    assert_eq!(response.status(), 200);
    let content_type = response.headers()["content-type"].to_str()?.to_string();
    assert!(content_type.starts_with("text/html"));
    let body = response.text().await?;
    assert!(body.contains("<title>SMS Spam Classifier Demo</title>"));
    assert!(body.contains("id=\"sms-input\""));
    assert!(body.contains("<div id=\"loading-model\"></div>"));
    Ok(())
}

#[tokio::test]
async fn test_form_submission_flags_spam() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start(shipped_model_path(), Duration::ZERO);
    let client = reqwest::Client::new();

    let body = client
        .post(server.url("/"))
        .form(&[("message", SPAM_MESSAGE)])
        .send()
        .await?
        .text()
        .await?;

    assert!(body.contains("Classification: Spam"));
    assert!(body.contains("class=\"flagged\""));
    // The submitted text is kept in the textarea
    assert!(body.contains("WINNER!! ... Call this number immediately: +1234567890</textarea>"));
    Ok(())
}

#[tokio::test]
async fn test_form_submission_empty_message() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start(shipped_model_path(), Duration::ZERO);
    let client = reqwest::Client::new();

    let body = client
        .post(server.url("/"))
        .form(&[("message", "")])
        .send()
        .await?
        .text()
        .await?;

    assert!(body.contains("Please enter a message to classify"));
    assert!(body.contains("class=\"warning\""));
    Ok(())
}

#[tokio::test]
async fn test_api_classify() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start(shipped_model_path(), Duration::ZERO);
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/classify"))
        .json(&json!({ "message": "Hi mom, could you pick me up after practice at 5?" }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let value: Value = response.json().await?;
    assert_eq!(value["label"], "Ham");
    assert_eq!(value["is_spam"], false);
    assert!(value["confidence_text"].as_str().unwrap().ends_with('%'));

    let response = client
        .post(server.url("/api/classify"))
        .json(&json!({ "message": "" }))
        .send()
        .await?;
    assert_eq!(response.status(), 422);
    let value: Value = response.json().await?;
    assert_eq!(value["kind"], "validation");

    let response = client
        .post(server.url("/api/classify"))
        .body("not json")
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    Ok(())
}

#[tokio::test]
async fn test_missing_model_reports_errors() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::start(dir.path().join("absent.json"), Duration::ZERO);
    let client = reqwest::Client::new();

    let health: Value = client.get(server.url("/healthz")).send().await?.json().await?;
    assert_eq!(health["model_loaded"], false);
    assert_eq!(health["load_status"], "");

    let response = client
        .post(server.url("/api/classify"))
        .json(&json!({ "message": SPAM_MESSAGE }))
        .send()
        .await?;
    assert_eq!(response.status(), 503);
    let value: Value = response.json().await?;
    assert_eq!(value["kind"], "inference");

    let body = client
        .post(server.url("/"))
        .form(&[("message", SPAM_MESSAGE)])
        .send()
        .await?
        .text()
        .await?;
    assert!(body.contains("Error in classification: model is not loaded"));
    Ok(())
}

#[tokio::test]
async fn test_corrupt_model_shows_load_status() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("model.json");
    std::fs::write(&path, "corrupted data")?;
    let server = TestServer::start(path, Duration::ZERO);

    let body = reqwest::get(server.url("/")).await?.text().await?;
    assert!(body.contains("Error loading model: Invalid model artifact"));

    let health: Value = reqwest::get(server.url("/healthz")).await?.json().await?;
    assert_eq!(health["model_loaded"], false);
    Ok(())
}

#[tokio::test]
async fn test_requests_before_trigger_see_unloaded_model() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start(shipped_model_path(), Duration::from_secs(3600));

    let health: Value = reqwest::get(server.url("/healthz")).await?.json().await?;
    assert_eq!(health["model_loaded"], false);
    Ok(())
}

#[tokio::test]
async fn test_model_loads_after_delay() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start(shipped_model_path(), Duration::from_millis(300));
    let client = reqwest::Client::new();

    let health: Value = client.get(server.url("/healthz")).send().await?.json().await?;
    assert_eq!(health["model_loaded"], false);

    // The idle loop wakes up for the deadline, so no request is needed to fire it
    tokio::time::sleep(Duration::from_millis(600)).await;

    let mut loaded = false;
    for _ in 0..50 {
        let health: Value = client.get(server.url("/healthz")).send().await?.json().await?;
        if health["model_loaded"] == true {
            assert_eq!(health["load_status"], "");
            loaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(loaded, "model was never loaded");
    Ok(())
}

#[tokio::test]
async fn test_health_after_load() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start(shipped_model_path(), Duration::ZERO);

    let health: Value = reqwest::get(server.url("/healthz")).await?.json().await?;
    assert_eq!(health["model_loaded"], true);
    assert_eq!(health["model"]["sha256"].as_str().map(str::len), Some(64));
    Ok(())
}

#[tokio::test]
async fn test_routing_errors() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start(shipped_model_path(), Duration::ZERO);
    let client = reqwest::Client::new();

    assert_eq!(client.get(server.url("/missing")).send().await?.status(), 404);
    assert_eq!(client.delete(server.url("/")).send().await?.status(), 405);
    assert_eq!(client.get(server.url("/api/classify")).send().await?.status(), 405);
    Ok(())
}

#[tokio::test]
async fn test_oversized_body_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start(shipped_model_path(), Duration::ZERO);
    let client = reqwest::Client::new();
    let huge = "free ".repeat(1000);

    let response = client
        .post(server.url("/api/classify"))
        .json(&json!({ "message": huge }))
        .send()
        .await?;
    assert_eq!(response.status(), 413);

    let response = client
        .post(server.url("/"))
        .form(&[("message", huge.as_str())])
        .send()
        .await?;
    assert_eq!(response.status(), 413);
    assert!(response.text().await?.contains("exceeds 1024 bytes"));
    Ok(())
}
