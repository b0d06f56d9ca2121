//! HTTP capture middleware for recording adapter exchanges.
//!
//! Enable by setting `CAPTURE_DIR` to an output directory. Each matching
//! request/response pair is written as one JSON file in a timestamped
//! session subdirectory, alongside a `manifest.json` listing the files in
//! order. The file format is the same `CapturedExchange` shape the test
//! suite's replay layer mounts on mock servers, so a capture taken against
//! the live adapter can be replayed directly.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CAPTURE_DIR` | unset | Enables capture, sets output directory |
//! | `CAPTURE_FILTER` | `delivery` | What to capture: `delivery`, `all`, or comma-separated patterns |
//!
//! Call [`init_capture_session`] early in `main()`, before any client is
//! built, so every client in the process captures into the same session.

use async_trait::async_trait;
use chrono::{Local, Utc};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result as MiddlewareResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

// ============================================================================
// SESSION INITIALIZATION
// ============================================================================

/// Capture session configuration returned by [`init_capture_session`].
#[derive(Debug, Clone)]
pub struct CaptureSession {
    /// Absolute path to the session directory where captures land
    pub session_dir: PathBuf,
    /// The capture filter description (e.g., "delivery", "all")
    pub filter: String,
}

/// Set up a timestamped capture session under `CAPTURE_DIR`.
///
/// Creates `session_<timestamp>/` below the configured base directory,
/// verifies it is writable, and repoints `CAPTURE_DIR` at it so all
/// subsequently-built clients capture into the same session.
///
/// Returns `None` when `CAPTURE_DIR` is not set (capture disabled), and an
/// error when the directory cannot be created or written.
pub fn init_capture_session() -> Result<Option<CaptureSession>, std::io::Error> {
    let base_dir = match std::env::var("CAPTURE_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => return Ok(None), // Capture disabled
    };

    std::fs::create_dir_all(&base_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let session_dir = base_dir.join(format!("session_{}", timestamp));
    std::fs::create_dir_all(&session_dir)?;

    // Verify the directory is writable before the first real capture
    let probe = session_dir.join(".write_test");
    std::fs::write(&probe, b"test")?;
    std::fs::remove_file(&probe)?;

    let session_dir = session_dir.canonicalize().unwrap_or(session_dir);

    // Repoint CAPTURE_DIR so every CaptureMiddleware built after this
    // shares the session
    std::env::set_var("CAPTURE_DIR", &session_dir);

    let filter = CaptureFilter::from_env().description();

    info!("[CAPTURE] Session initialized: {}", session_dir.display());
    info!("[CAPTURE] Filter: {}", filter);

    Ok(Some(CaptureSession {
        session_dir,
        filter,
    }))
}

/// Quick check whether capture mode is on (no directories are created).
pub fn is_capture_enabled() -> bool {
    std::env::var("CAPTURE_DIR")
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Captured HTTP exchange (request + response pair)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedExchange {
    /// ISO 8601 timestamp when the exchange was captured
    pub captured_at: String,
    /// Monotonic sequence number for ordering
    pub sequence: u32,
    /// Request-to-response latency in milliseconds
    pub latency_ms: u64,
    pub request: CapturedRequest,
    pub response: CapturedResponse,
}

/// Captured HTTP request details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    /// Request headers, sensitive ones excluded
    pub headers: HashMap<String, String>,
    /// Request body parsed as JSON (if applicable)
    pub body: Option<serde_json::Value>,
}

/// Captured HTTP response details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// Raw response body as string
    pub body_raw: String,
    /// Response body parsed as JSON (if applicable)
    pub body_parsed: Option<serde_json::Value>,
}

/// Manifest tracking capture session metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureManifest {
    pub started_at: String,
    pub capture_filter: String,
    /// Captured filenames in write order
    pub files: Vec<String>,
}

impl CaptureManifest {
    pub fn new(capture_filter: String) -> Self {
        Self {
            started_at: Utc::now().to_rfc3339(),
            capture_filter,
            files: Vec::new(),
        }
    }

    pub fn add_file(&mut self, filename: String) {
        self.files.push(filename);
    }
}

/// Filter for which requests to capture
#[derive(Debug, Clone)]
pub enum CaptureFilter {
    /// Capture requests whose URL contains any of these substrings
    PathContains(Vec<String>),
    /// Capture all requests
    All,
}

impl Default for CaptureFilter {
    fn default() -> Self {
        // The adapter's flow endpoints all live under /delivery; the
        // schedule endpoint is /location/{id}/delivery and matches too.
        CaptureFilter::PathContains(vec!["/delivery".to_string()])
    }
}

impl CaptureFilter {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            CaptureFilter::PathContains(patterns) => patterns.iter().any(|p| url.contains(p)),
            CaptureFilter::All => true,
        }
    }

    /// Parse from the `CAPTURE_FILTER` environment variable.
    ///
    /// - "all" -> everything
    /// - "delivery" or unset -> adapter delivery endpoints
    /// - comma-separated patterns -> those substrings
    pub fn from_env() -> Self {
        match std::env::var("CAPTURE_FILTER").ok().as_deref() {
            Some("all") => CaptureFilter::All,
            Some("delivery") | None => CaptureFilter::default(),
            Some(patterns) => CaptureFilter::PathContains(
                patterns
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
        }
    }

    pub fn description(&self) -> String {
        match self {
            CaptureFilter::All => "all".to_string(),
            CaptureFilter::PathContains(patterns) => {
                if patterns == &["/delivery".to_string()] {
                    "delivery".to_string()
                } else {
                    patterns.join(",")
                }
            }
        }
    }
}

// ============================================================================
// MIDDLEWARE
// ============================================================================

/// Middleware that writes matching HTTP traffic to JSON files.
pub struct CaptureMiddleware {
    output_dir: PathBuf,
    filter: CaptureFilter,
    manifest: Arc<Mutex<CaptureManifest>>,
    /// Per-instance sequence counter, starts at 1
    sequence: Arc<AtomicU32>,
}

impl CaptureMiddleware {
    /// Directory creation and the initial manifest write are blocking since
    /// this runs once at client construction; captures use async I/O.
    pub fn new(output_dir: PathBuf, filter: CaptureFilter) -> Self {
        if let Err(e) = std::fs::create_dir_all(&output_dir) {
            error!(
                "[CAPTURE] Failed to create output directory {:?}: {}",
                output_dir, e
            );
        } else {
            info!("[CAPTURE] Capturing adapter traffic to {:?}", output_dir);
        }

        let manifest = Arc::new(Mutex::new(CaptureManifest::new(filter.description())));
        Self::write_manifest_sync(&output_dir, &manifest);

        Self {
            output_dir,
            filter,
            manifest,
            sequence: Arc::new(AtomicU32::new(1)),
        }
    }

    /// Create from `CAPTURE_DIR`; `None` (and zero HTTP-path overhead) when unset.
    pub fn from_env() -> Option<Self> {
        std::env::var("CAPTURE_DIR")
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(|dir| Self::new(PathBuf::from(dir), CaptureFilter::from_env()))
    }

    /// Filename for a captured exchange: `{sequence}_{method}_{endpoint}.json`,
    /// e.g. `001_POST_estimate.json` for the estimate endpoint.
    fn generate_filename(&self, exchange: &CapturedExchange) -> String {
        let endpoint = exchange
            .request
            .url
            .split('/')
            .next_back()
            .unwrap_or("unknown")
            .split('?')
            .next()
            .unwrap_or("unknown")
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .take(30)
            .collect::<String>();

        format!(
            "{:03}_{}_{}.json",
            exchange.sequence, exchange.request.method, endpoint
        )
    }

    async fn save_capture(&self, exchange: &CapturedExchange) {
        let filename = self.generate_filename(exchange);
        let filepath = self.output_dir.join(&filename);

        match serde_json::to_string_pretty(exchange) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&filepath, json).await {
                    error!("[CAPTURE] Failed to write {:?}: {}", filepath, e);
                } else {
                    debug!("[CAPTURE] Saved {}", filename);
                    if let Ok(mut manifest) = self.manifest.lock() {
                        manifest.add_file(filename);
                    }
                    self.write_manifest_async().await;
                }
            }
            Err(e) => error!("[CAPTURE] Failed to serialize capture: {}", e),
        }
    }

    async fn write_manifest_async(&self) {
        let manifest_path = self.output_dir.join("manifest.json");
        // Serialize while holding the lock, drop the guard before awaiting
        let json_result = match self.manifest.lock() {
            Ok(manifest) => serde_json::to_string_pretty(&*manifest),
            Err(e) => {
                warn!("[CAPTURE] Failed to lock manifest for writing: {}", e);
                return;
            }
        };
        match json_result {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&manifest_path, json).await {
                    warn!("[CAPTURE] Failed to write manifest: {}", e);
                }
            }
            Err(e) => warn!("[CAPTURE] Failed to serialize manifest: {}", e),
        }
    }

    fn write_manifest_sync(output_dir: &PathBuf, manifest: &Arc<Mutex<CaptureManifest>>) {
        let manifest_path = output_dir.join("manifest.json");
        match manifest.lock() {
            Ok(manifest) => match serde_json::to_string_pretty(&*manifest) {
                Ok(json) => {
                    if let Err(e) = std::fs::write(&manifest_path, json) {
                        warn!("[CAPTURE] Failed to write manifest: {}", e);
                    }
                }
                Err(e) => warn!("[CAPTURE] Failed to serialize manifest: {}", e),
            },
            Err(e) => warn!("[CAPTURE] Failed to lock manifest for writing: {}", e),
        }
    }

    /// Header names that must never be written to disk.
    fn is_sensitive_header(name: &str) -> bool {
        let lower = name.to_lowercase();
        lower.contains("authorization")
            || lower.contains("api-key")
            || lower.contains("api_key")
            || lower.contains("secret")
            || lower.contains("password")
            || lower.contains("token")
            || lower.contains("private")
            || lower.contains("cookie")
    }

    fn extract_request_headers(req: &Request) -> HashMap<String, String> {
        req.headers()
            .iter()
            .filter(|(k, _)| !Self::is_sensitive_header(k.as_str()))
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect()
    }

    fn extract_response_headers(resp: &Response) -> HashMap<String, String> {
        resp.headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect()
    }
}

#[async_trait]
impl Middleware for CaptureMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> MiddlewareResult<Response> {
        let url = req.url().to_string();

        // Fast path: skip capture if URL doesn't match the filter
        if !self.filter.matches(&url) {
            return next.run(req, extensions).await;
        }

        let method = req.method().to_string();
        let request_headers = Self::extract_request_headers(&req);
        let body_bytes = req.body().and_then(|b| b.as_bytes()).map(|b| b.to_vec());
        let request_body: Option<serde_json::Value> = body_bytes
            .as_ref()
            .and_then(|b| serde_json::from_slice(b).ok());

        let start = std::time::Instant::now();
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);

        let response = next.run(req, extensions).await?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let status = response.status().as_u16();
        let response_headers = Self::extract_response_headers(&response);

        // Reading the body consumes the response; it is rebuilt below
        let body_bytes = response.bytes().await?;
        let body_raw = String::from_utf8_lossy(&body_bytes).to_string();
        let body_parsed: Option<serde_json::Value> = serde_json::from_slice(&body_bytes).ok();

        let exchange = CapturedExchange {
            captured_at: Utc::now().to_rfc3339(),
            sequence,
            latency_ms,
            request: CapturedRequest {
                method,
                url,
                headers: request_headers,
                body: request_body,
            },
            response: CapturedResponse {
                status,
                headers: response_headers.clone(),
                body_raw,
                body_parsed,
            },
        };

        self.save_capture(&exchange).await;

        let mut builder = http::Response::builder().status(status);
        for (k, v) in response_headers.iter() {
            if let Ok(name) = http::header::HeaderName::try_from(k.as_str()) {
                if let Ok(value) = http::header::HeaderValue::from_str(v) {
                    builder = builder.header(name, value);
                }
            }
        }
        let http_response = builder.body(body_bytes).map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!(
                "Failed to rebuild response: {}",
                e
            ))
        })?;

        Ok(Response::from(http_response))
    }
}

/// Build a reqwest client, adding capture middleware when `CAPTURE_DIR` is set.
pub fn build_client_with_capture(
    base_builder: reqwest::ClientBuilder,
) -> reqwest_middleware::ClientWithMiddleware {
    let client = base_builder.build().expect("Failed to build HTTP client");

    let mut builder = reqwest_middleware::ClientBuilder::new(client);

    if let Some(capture) = CaptureMiddleware::from_env() {
        builder = builder.with(capture);
    }

    builder.build()
}
