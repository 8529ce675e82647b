//! Base API client
//!
//! Resolves URLs against the configured base, applies default headers,
//! times every request and turns whatever comes back into an
//! [`ApiResponse`]. Verification helpers log before propagating.

use gatecheck_common::{
    ApiResponse, ApiSettings, AssertionHelper, Error, HttpMethod, NullReporter, ReportSink,
    Result, TestContext,
};
use reqwest::Url;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::transport::{Transport, TransportRequest};

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers merged over the defaults
    pub headers: BTreeMap<String, String>,

    /// JSON request body
    pub json: Option<Value>,

    /// Query parameters
    pub query: Vec<(String, String)>,

    /// Overrides the configured timeout
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn json(body: Value) -> Self {
        Self {
            json: Some(body),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// Client shared by every API area
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    settings: ApiSettings,
    context: TestContext,
    reporter: Arc<dyn ReportSink>,
    assertions: AssertionHelper,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        settings: ApiSettings,
        context: TestContext,
        reporter: Arc<dyn ReportSink>,
    ) -> Self {
        let assertions = AssertionHelper::new(reporter.clone());
        Self {
            transport,
            settings,
            context,
            reporter,
            assertions,
        }
    }

    /// Client with a fresh context and no report sink
    pub fn detached(transport: Arc<dyn Transport>, settings: ApiSettings) -> Self {
        Self::new(
            transport,
            settings,
            TestContext::new("adhoc"),
            Arc::new(NullReporter),
        )
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn context(&self) -> &TestContext {
        &self.context
    }

    pub fn correlation_id(&self) -> &str {
        &self.context.correlation_id
    }

    pub fn reporter(&self) -> &dyn ReportSink {
        self.reporter.as_ref()
    }

    pub fn assertions(&self) -> &AssertionHelper {
        &self.assertions
    }

    /// Absolute http(s) URLs pass through; relative paths resolve under the base URL
    pub fn build_url(&self, path: &str) -> Result<String> {
        if let Ok(url) = Url::parse(path) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url.to_string());
            }
        }

        let mut base = self.settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .and_then(|base| base.join(path.trim_start_matches('/')))
            .map(|url| url.to_string())
            .map_err(|e| Error::InvalidConfig(format!("Cannot resolve '{}' against '{}': {}", path, base, e)))
    }

    pub fn default_headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), self.settings.user_agent.clone()),
        ])
    }

    pub fn request(&self, method: HttpMethod, path: &str, options: RequestOptions) -> Result<ApiResponse> {
        let url = self.build_url(path)?;
        let mut headers = self.default_headers();
        headers.extend(options.headers);
        let timeout = options.timeout.unwrap_or_else(|| self.settings.timeout());
        let timeout_ms = timeout.as_millis() as u64;

        info!(
            correlation_id = %self.context.correlation_id,
            method = %method,
            url = %url,
            headers_count = headers.len(),
            has_body = options.json.is_some(),
            timeout_ms,
            "Making {} request to {}", method, url
        );

        let request = TransportRequest {
            method,
            url: url.clone(),
            headers,
            body: options.json,
            query: options.query,
            timeout,
        };

        let start = Instant::now();
        match self.transport.execute(&request) {
            Ok(raw) => {
                let response = ApiResponse::from_transport(raw, method, start.elapsed());
                info!(
                    correlation_id = %self.context.correlation_id,
                    status_code = response.status_code,
                    duration_ms = response.duration_ms,
                    "Request completed: {} {}", method, url
                );
                if response.body.is_empty() {
                    debug!("Response body: empty");
                } else {
                    debug!("Response body: {}", response.body);
                }
                Ok(response)
            }
            Err(e) => {
                let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
                error!(
                    correlation_id = %self.context.correlation_id,
                    duration_ms,
                    category = e.category(),
                    "Request failed: {} {}: {}", method, url, e
                );
                Err(e)
            }
        }
    }

    pub fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(HttpMethod::Get, path, RequestOptions::default())
    }

    pub fn post_json(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.request(HttpMethod::Post, path, RequestOptions::json(body))
    }

    pub fn put_json(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.request(HttpMethod::Put, path, RequestOptions::json(body))
    }

    pub fn patch_json(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.request(HttpMethod::Patch, path, RequestOptions::json(body))
    }

    pub fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(HttpMethod::Delete, path, RequestOptions::default())
    }

    pub fn verify_response_status(&self, response: &ApiResponse, expected: u16) -> Result<()> {
        response.verify_status(expected).map_err(|e| {
            error!(correlation_id = %self.context.correlation_id, "{}", e);
            e
        })?;
        debug!("Status code verification passed: {}", expected);
        Ok(())
    }

    pub fn verify_response_contains_keys(&self, response: &ApiResponse, keys: &[&str]) -> Result<()> {
        response.verify_contains_keys(keys).map_err(|e| {
            error!(correlation_id = %self.context.correlation_id, "{}", e);
            e
        })?;
        debug!("Response contains all required keys: {:?}", keys);
        Ok(())
    }
}
