//! HTTP transports
//!
//! The clients never talk to the network directly; they hand a
//! [`TransportRequest`] to a [`Transport`] and get a [`TransportResponse`]
//! back. [`ReqwestTransport`] does real HTTP, [`ReplayTransport`] serves
//! canned responses for tests and offline runs.

use gatecheck_common::{Error, HttpMethod, Result, TransportResponse};
use parking_lot::Mutex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// A fully resolved request
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
    pub timeout: Duration,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            query: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Path component of the URL without scheme, host, query or fragment
    pub fn path(&self) -> String {
        url_path(&self.url)
    }
}

/// Executes requests
pub trait Transport: Send + Sync {
    fn execute(&self, request: &TransportRequest) -> Result<TransportResponse>;
}

/// Blocking HTTP transport backed by reqwest
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                Error::Transport(format!(
                    "{} {} timed out after {} ms",
                    request.method,
                    request.url,
                    request.timeout.as_millis()
                ))
            } else {
                Error::Transport(format!("{} {} failed: {}", request.method, request.url, e))
            }
        })?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body_text = response
            .text()
            .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

        Ok(TransportResponse {
            status,
            headers,
            body_text,
            url,
        })
    }
}

/// One canned exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default = "default_status")]
    pub status: u16,
    /// JSON body; a plain string is served verbatim
    #[serde(default)]
    pub body: Option<Value>,
    /// When set the transport fails with this message instead of responding
    #[serde(default)]
    pub error: Option<String>,
}

fn default_status() -> u16 {
    200
}

impl ReplayEntry {
    fn body_text(&self) -> String {
        match &self.body {
            None => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(value) => value.to_string(),
        }
    }
}

/// Serves canned responses keyed by method and path.
///
/// Entries for the same route are served in order; the last one is repeated
/// once the queue is down to a single entry. Every request is recorded.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    routes: Mutex<HashMap<(HttpMethod, String), VecDeque<ReplayEntry>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load entries from a YAML or JSON file holding a list of exchanges
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<ReplayEntry> = if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        let transport = Self::new();
        for entry in entries {
            transport.push(entry);
        }
        Ok(transport)
    }

    pub fn push(&self, entry: ReplayEntry) {
        self.routes
            .lock()
            .entry((entry.method, entry.path.clone()))
            .or_default()
            .push_back(entry);
    }

    /// Queue a response with a raw text body
    pub fn respond(self, method: HttpMethod, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.push(ReplayEntry {
            method,
            path: path.to_string(),
            status,
            body: Some(Value::String(body.into())),
            error: None,
        });
        self
    }

    /// Queue a response with a JSON body
    pub fn respond_json(self, method: HttpMethod, path: &str, status: u16, body: Value) -> Self {
        self.push(ReplayEntry {
            method,
            path: path.to_string(),
            status,
            body: Some(body),
            error: None,
        });
        self
    }

    /// Queue a transport failure
    pub fn fail(self, method: HttpMethod, path: &str, message: impl Into<String>) -> Self {
        self.push(ReplayEntry {
            method,
            path: path.to_string(),
            status: 0,
            body: None,
            error: Some(message.into()),
        });
        self
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn next_entry(&self, method: HttpMethod, path: &str) -> Option<ReplayEntry> {
        let mut routes = self.routes.lock();
        let queue = routes.get_mut(&(method, path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Transport for ReplayTransport {
    fn execute(&self, request: &TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().push(request.clone());
        let path = request.path();

        let entry = self.next_entry(request.method, &path).ok_or_else(|| {
            Error::Transport(format!("No replay entry for {} {}", request.method, path))
        })?;
        debug!("Replaying {} {} -> {}", request.method, path, entry.status);

        if let Some(message) = &entry.error {
            return Err(Error::Transport(message.clone()));
        }

        Ok(TransportResponse {
            status: entry.status,
            headers: BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
            body_text: entry.body_text(),
            url: request.url.clone(),
        })
    }
}

/// Path component of an absolute URL, or of a bare path such as `/api/airports`
pub fn url_path(url: &str) -> String {
    let parsed = Url::parse(url).or_else(|_| {
        Url::parse("http://localhost/").and_then(|base| base.join(url))
    });
    match parsed {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    }
}
