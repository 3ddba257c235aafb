use std::io::{self, Cursor, Read};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::classifier::{Classifier, ClassifierError};
use crate::config::AppConfig;
use crate::model_manager::{LoadOutcome, ModelHandle, ModelInfo, ModelLoader};
use crate::ui::{self, DisplayMessage, Page, Style};

type HttpResponse = Response<Cursor<Vec<u8>>>;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("request body is not valid UTF-8")]
    NotUtf8,
    #[error("failed to read request body: {0}")]
    Io(#[from] io::Error),
}

impl BodyError {
    fn status(&self) -> u16 {
        match self {
            Self::TooLarge { .. } => 413,
            Self::NotUtf8 => 400,
            Self::Io(_) => 500,
        }
    }
}

/// One-shot timer that fires a fixed delay after it is armed.
#[derive(Debug)]
pub struct StartupTrigger {
    deadline: Instant,
    fired: bool,
}

impl StartupTrigger {
    pub fn after(delay: Duration) -> Self {
        Self {
            deadline: Instant::now() + delay,
            fired: false,
        }
    }

    /// Time left before the trigger is due, or `None` once it has fired.
    pub fn remaining(&self) -> Option<Duration> {
        if self.fired {
            None
        } else {
            Some(self.deadline.saturating_duration_since(Instant::now()))
        }
    }

    /// Returns `true` exactly once, on the first call at or after the deadline.
    pub fn poll(&mut self) -> bool {
        if self.fired || Instant::now() < self.deadline {
            return false;
        }
        self.fired = true;
        true
    }
}

/// Stops a running [`DemoServer`] from another thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    server: Arc<Server>,
    stop: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.stop.store(true, Ordering::SeqCst);
        self.server.unblock();
    }
}

#[derive(Deserialize)]
struct ClassifyRequest {
    message: Option<String>,
}

#[derive(Serialize)]
struct ClassifyResponse {
    label: &'static str,
    confidence: f32,
    confidence_text: String,
    is_spam: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    model_loaded: bool,
    load_status: &'a str,
    model: Option<&'a ModelInfo>,
}

/// The demo web server.
///
/// Requests are served one at a time on the thread that calls [`DemoServer::run`].
/// The model load is armed when the socket is bound and runs on that same thread
/// between requests, so loading and classification never overlap. A request that
/// arrives before the trigger fires sees an unloaded model.
pub struct DemoServer {
    server: Arc<Server>,
    config: AppConfig,
    loader: ModelLoader,
    classifier: Classifier,
    load_status: String,
    trigger: StartupTrigger,
    stop: Arc<AtomicBool>,
}

impl DemoServer {
    /// Binds the listening socket and arms the startup trigger.
    pub fn bind(config: AppConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let server = Server::http(&addr).map_err(|e| ServerError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

        let handle = ModelHandle::new();
        let mut loader = ModelLoader::new(&config.model_path, handle.clone());
        if let Some(sha256) = &config.expected_sha256 {
            loader = loader.with_expected_sha256(sha256.clone());
        }
        let classifier = Classifier::new(handle).with_max_input_chars(config.max_input_chars);
        let trigger = StartupTrigger::after(config.load_delay);

        Ok(Self {
            server: Arc::new(server),
            config,
            loader,
            classifier,
            load_status: String::new(),
            trigger,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server: Arc::clone(&self.server),
            stop: Arc::clone(&self.stop),
        }
    }

    /// Serves requests until [`ShutdownHandle::shutdown`] is called.
    pub fn run(mut self) {
        match self.local_addr() {
            Some(addr) => info!("{} listening on http://{}", self.config.title, addr),
            None => info!("{} listening", self.config.title),
        }

        while !self.stop.load(Ordering::SeqCst) {
            self.fire_startup_trigger();

            let wait = self
                .trigger
                .remaining()
                .map_or(self.config.poll_interval, |r| r.min(self.config.poll_interval));
            let request = match self.server.recv_timeout(wait) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => {
                    if !self.stop.load(Ordering::SeqCst) {
                        warn!("Failed to receive request: {}", e);
                    }
                    continue;
                }
            };

            self.fire_startup_trigger();
            self.handle_request(request);
        }

        info!("Server stopped");
    }

    fn fire_startup_trigger(&mut self) {
        if !self.trigger.poll() {
            return;
        }

        info!("Startup trigger fired, loading model from {:?}", self.loader.path());
        let result = self.loader.load_once();
        match &result {
            Ok(LoadOutcome::Loaded(info)) => info!("Model ready (sha256 {})", info.sha256),
            Ok(LoadOutcome::Missing) => warn!("Model artifact {:?} not found", self.loader.path()),
            Ok(LoadOutcome::AlreadyAttempted) => {}
            Err(e) => error!("Model load failed: {}", e),
        }
        self.load_status = ui::load_status_text(&result);
    }

    fn handle_request(&self, mut request: Request) {
        let method = request.method().clone();
        let path = request.url().split('?').next().unwrap_or("/").to_string();

        let response = match (&method, path.as_str()) {
            (Method::Get, "/") => self.render(None, None, 200),
            (Method::Post, "/") => self.handle_form(&mut request),
            (Method::Post, "/api/classify") => self.handle_api(&mut request),
            (Method::Get, "/healthz") => self.handle_health(),
            (_, "/" | "/api/classify" | "/healthz") => text_response(405, "Method Not Allowed"),
            _ => text_response(404, "Not Found"),
        };

        info!("{} {} -> {}", method, path, response.status_code().0);
        if let Err(e) = request.respond(response) {
            warn!("Failed to send response: {}", e);
        }
    }

    fn handle_form(&self, request: &mut Request) -> HttpResponse {
        let body = match self.read_body(request) {
            Ok(body) => body,
            Err(e) => {
                let output = (
                    DisplayMessage::Text(format!("Error in classification: {}", e)),
                    Style::Error,
                );
                return self.render(None, Some(output), e.status());
            }
        };

        let message = url::form_urlencoded::parse(body.as_bytes())
            .find(|(key, _)| key == "message")
            .map(|(_, value)| value.into_owned());
        debug!("Form submission with {} bytes of message", message.as_deref().map_or(0, str::len));

        let output = ui::respond(&self.classifier, message.as_deref());
        self.render(message.as_deref(), Some(output), 200)
    }

    fn handle_api(&self, request: &mut Request) -> HttpResponse {
        let body = match self.read_body(request) {
            Ok(body) => body,
            Err(e) => return error_response(e.status(), e.to_string(), "validation"),
        };
        let payload: ClassifyRequest = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(e) => return error_response(400, format!("invalid JSON: {}", e), "validation"),
        };

        match self.classifier.classify(payload.message.as_deref()) {
            Ok(result) => json_response(
                200,
                &ClassifyResponse {
                    label: result.label,
                    confidence: result.confidence,
                    confidence_text: result.confidence_text(),
                    is_spam: result.is_spam,
                },
            ),
            Err(e) => {
                let status = match &e {
                    ClassifierError::ValidationError(_) => 422,
                    ClassifierError::ModelNotLoaded => 503,
                    ClassifierError::PredictionError(_) | ClassifierError::ModelError(_) => 500,
                };
                error_response(status, e.to_string(), e.kind().as_str())
            }
        }
    }

    fn handle_health(&self) -> HttpResponse {
        let loaded = self.classifier.handle().get();
        json_response(
            200,
            &HealthResponse {
                model_loaded: loaded.is_some(),
                load_status: &self.load_status,
                model: loaded.map(|m| &m.info),
            },
        )
    }

    fn read_body(&self, request: &mut Request) -> Result<String, BodyError> {
        let limit = self.config.max_body_bytes;
        if request.body_length().is_some_and(|len| len > limit) {
            return Err(BodyError::TooLarge { limit });
        }

        let mut buf = Vec::new();
        request
            .as_reader()
            .take(limit as u64 + 1)
            .read_to_end(&mut buf)?;
        if buf.len() > limit {
            return Err(BodyError::TooLarge { limit });
        }
        String::from_utf8(buf).map_err(|_| BodyError::NotUtf8)
    }

    fn render(
        &self,
        message: Option<&str>,
        output: Option<(DisplayMessage, Style)>,
        status: u16,
    ) -> HttpResponse {
        let page = Page {
            title: &self.config.title,
            load_status: &self.load_status,
            message,
            output,
        };
        match ui::render_page(&page) {
            Ok(html) => body_response(status, html, "text/html; charset=utf-8"),
            Err(e) => {
                error!("Failed to render page: {}", e);
                text_response(500, "Internal Server Error")
            }
        }
    }
}

fn body_response(status: u16, body: String, content_type: &str) -> HttpResponse {
    let response = Response::from_data(body.into_bytes()).with_status_code(StatusCode(status));
    match Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn text_response(status: u16, body: &str) -> HttpResponse {
    body_response(status, body.to_string(), "text/plain; charset=utf-8")
}

fn json_response<T: Serialize>(status: u16, value: &T) -> HttpResponse {
    match serde_json::to_string(value) {
        Ok(body) => body_response(status, body, "application/json"),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            text_response(500, "Internal Server Error")
        }
    }
}

fn error_response(status: u16, error: String, kind: &'static str) -> HttpResponse {
    json_response(status, &ErrorResponse { error, kind })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_fires_once() {
        let mut trigger = StartupTrigger::after(Duration::ZERO);
        assert!(trigger.poll());
        assert!(!trigger.poll());
        assert_eq!(trigger.remaining(), None);
    }

    #[test]
    fn test_trigger_waits_for_deadline() {
        let mut trigger = StartupTrigger::after(Duration::from_secs(3600));
        assert!(!trigger.poll());
        let remaining = trigger.remaining().unwrap();
        assert!(remaining > Duration::from_secs(3500));
    }

    #[test]
    fn test_bind_failure_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: taken.local_addr().unwrap().port(),
            ..AppConfig::default()
        };
        assert!(matches!(DemoServer::bind(config), Err(ServerError::Bind { .. })));
    }
}
