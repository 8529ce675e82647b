//! Normalised HTTP responses
//!
//! Every request made through the API clients ends up as an [`ApiResponse`],
//! whatever the status code or body looks like. Bodies are parsed as JSON when
//! possible and kept as text otherwise; an empty body is an empty string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// HTTP methods the transport layer accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedMethod(s.to_string()))
    }
}

/// What the transport hands back before normalisation
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body_text: String,
    pub url: String,
}

/// Parsed response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// JSON when it parses, raw text otherwise, `Text("")` when empty
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return ResponseBody::Text(String::new());
        }
        match serde_json::from_str(text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text.to_string()),
        }
    }

    /// Short name of the body's shape, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseBody::Json(Value::Object(_)) => "object",
            ResponseBody::Json(Value::Array(_)) => "array",
            ResponseBody::Json(Value::String(_)) => "string",
            ResponseBody::Json(Value::Number(_)) => "number",
            ResponseBody::Json(Value::Bool(_)) => "bool",
            ResponseBody::Json(Value::Null) => "null",
            ResponseBody::Text(_) => "text",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseBody::Text(t) if t.is_empty())
    }
}

impl Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{}", value),
            ResponseBody::Text(text) => f.write_str(text),
        }
    }
}

/// A normalised HTTP response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
    pub url: String,
    pub method: HttpMethod,
    pub duration_ms: f64,
}

impl ApiResponse {
    pub fn from_transport(raw: TransportResponse, method: HttpMethod, elapsed: Duration) -> Self {
        Self {
            status_code: raw.status,
            headers: raw.headers,
            body: ResponseBody::parse(&raw.body_text),
            url: raw.url,
            method,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn json_object(&self) -> Option<&Map<String, Value>> {
        match &self.body {
            ResponseBody::Json(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Fails with `StatusMismatch` unless the status equals `expected`
    pub fn verify_status(&self, expected: u16) -> Result<()> {
        if self.status_code != expected {
            return Err(Error::StatusMismatch {
                expected,
                actual: self.status_code,
                body: self.body.to_string(),
            });
        }
        Ok(())
    }

    /// Fails unless the body is an object holding every key in `required`.
    ///
    /// All absent keys are reported at once, together with the keys that are
    /// present.
    pub fn verify_contains_keys(&self, required: &[&str]) -> Result<()> {
        let object = self.json_object().ok_or_else(|| Error::MalformedBody {
            found: self.body.kind().to_string(),
        })?;

        let missing: Vec<String> = required
            .iter()
            .filter(|key| !object.contains_key(**key))
            .map(|key| key.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(Error::MissingKeys {
                missing,
                available: object.keys().cloned().collect(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse::from_transport(
            TransportResponse {
                status,
                headers: BTreeMap::new(),
                body_text: body.to_string(),
                url: "https://airportgap.com/api/airports".to_string(),
            },
            HttpMethod::Get,
            Duration::from_millis(120),
        )
    }

    #[test_case("", "text" ; "empty body")]
    #[test_case("not json", "text" ; "plain text")]
    #[test_case("{\"data\":[]}", "object" ; "json object")]
    #[test_case("[1,2]", "array" ; "json array")]
    fn test_body_parsing(text: &str, kind: &str) {
        let body = ResponseBody::parse(text);
        assert_eq!(body.kind(), kind);
        assert_eq!(body.to_string().is_empty(), text.is_empty());
    }

    #[test]
    fn test_empty_body_is_empty_string() {
        assert_eq!(ResponseBody::parse(""), ResponseBody::Text(String::new()));
        assert!(ResponseBody::parse("").is_empty());
        assert_eq!(
            ResponseBody::parse("oops"),
            ResponseBody::Text("oops".to_string())
        );
    }

    #[test_case(199, false)]
    #[test_case(200, true)]
    #[test_case(204, true)]
    #[test_case(299, true)]
    #[test_case(300, false)]
    #[test_case(404, false)]
    fn test_is_success(status: u16, expected: bool) {
        assert_eq!(response(status, "").is_success(), expected);
    }

    #[test]
    fn test_duration_recorded_in_millis() {
        let r = response(200, "");
        assert!((r.duration_ms - 120.0).abs() < 1e-6);
        assert_eq!(r.method, HttpMethod::Get);
    }

    #[test]
    fn test_verify_status_mismatch() {
        let err = response(404, "{\"errors\":\"not found\"}")
            .verify_status(200)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("200"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_verify_contains_keys_reports_all_missing() {
        let err = response(200, "{\"links\":{},\"meta\":{}}")
            .verify_contains_keys(&["data", "links", "included"])
            .unwrap_err();
        match err {
            Error::MissingKeys { missing, available } => {
                assert_eq!(missing, vec!["data".to_string(), "included".to_string()]);
                assert_eq!(available, vec!["links".to_string(), "meta".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_verify_contains_keys_requires_object() {
        let err = response(200, "[]").verify_contains_keys(&["data"]).unwrap_err();
        assert!(matches!(err, Error::MalformedBody { ref found } if found == "array"));

        let err = response(200, "").verify_contains_keys(&["data"]).unwrap_err();
        assert!(matches!(err, Error::MalformedBody { ref found } if found == "text"));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("PATCH".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!(matches!(
            "TRACE".parse::<HttpMethod>(),
            Err(Error::UnsupportedMethod(_))
        ));
    }
}
