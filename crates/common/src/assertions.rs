//! Assertion helpers with uniform failure diagnostics
//!
//! Every assertion either returns `Ok(())` or an [`AssertionFailure`] whose
//! message names the operation, the actual value, and what was expected. A
//! failing assertion is logged at `error` level and a text diagnostic is
//! attached to the report sink; a passing one only logs at `debug`.

use serde::Serialize;
use serde_json::{json, Value};
use std::any::type_name;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::reporting::{NullReporter, ReportSink};

/// A failed assertion with everything needed to diagnose it
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct AssertionFailure {
    pub operation: String,
    pub message: String,
    pub actual: String,
    pub expected: String,
    pub diagnostics: Option<Value>,
}

impl AssertionFailure {
    pub fn new(
        operation: impl Into<String>,
        message: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
            actual: actual.into(),
            expected: expected.into(),
            diagnostics: None,
        }
    }

    /// Failure whose message follows the `<operation> failed` layout of the named assertions
    pub fn check(
        operation: impl Into<String>,
        detail: impl std::fmt::Display,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        let operation = operation.into();
        let actual = actual.into();
        let expected = expected.into();
        let message = format!(
            "{} failed: {}\nExpected: {}\nActual: {}",
            operation, detail, expected, actual
        );
        Self::new(operation, message, actual, expected)
    }

    pub fn with_diagnostics(mut self, diagnostics: Value) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }
}

/// Adds a caller description in front of a failure message
pub trait AssertContext {
    fn context(self, description: impl Into<String>) -> Self;
}

impl<T> AssertContext for Result<T, AssertionFailure> {
    fn context(self, description: impl Into<String>) -> Self {
        self.map_err(|mut failure| {
            failure.message = format!("{}\n{}", description.into(), failure.message);
            failure
        })
    }
}

pub type AssertResult = Result<(), AssertionFailure>;

/// Named comparison operations
#[derive(Clone)]
pub struct AssertionHelper {
    reporter: Arc<dyn ReportSink>,
}

impl Default for AssertionHelper {
    fn default() -> Self {
        Self::new(Arc::new(NullReporter))
    }
}

impl AssertionHelper {
    pub fn new(reporter: Arc<dyn ReportSink>) -> Self {
        Self { reporter }
    }

    pub fn assert_equals<T: PartialEq + Debug>(&self, actual: T, expected: T) -> AssertResult {
        if actual == expected {
            debug!("Assertion passed: {:?} == {:?}", actual, expected);
            return Ok(());
        }

        let ty = short_type_name::<T>();
        let failure = AssertionFailure::new(
            "assert_equals",
            format!(
                "assert_equals failed: values are not equal.\nExpected: {:?} (type: {})\nActual: {:?} (type: {})",
                expected, ty, actual, ty
            ),
            format!("{:?}", actual),
            format!("{:?}", expected),
        )
        .with_diagnostics(json!({
            "expected": format!("{:?}", expected),
            "expected_type": ty,
            "actual": format!("{:?}", actual),
            "actual_type": ty,
        }));
        self.fail(failure, "Assertion Failure Details")
    }

    pub fn assert_not_equals<T: PartialEq + Debug>(&self, actual: T, unexpected: T) -> AssertResult {
        if actual != unexpected {
            debug!("Assertion passed: {:?} != {:?}", actual, unexpected);
            return Ok(());
        }

        let failure = AssertionFailure::new(
            "assert_not_equals",
            format!(
                "assert_not_equals failed: values should differ.\nExpected: anything but {:?}\nActual: {:?} (type: {})",
                unexpected,
                actual,
                short_type_name::<T>()
            ),
            format!("{:?}", actual),
            format!("not {:?}", unexpected),
        );
        self.fail(failure, "Not Equals Assertion Failure")
    }

    pub fn assert_contains(&self, text: &str, substring: &str, case_sensitive: bool) -> AssertResult {
        let found = if case_sensitive {
            text.contains(substring)
        } else {
            text.to_lowercase().contains(&substring.to_lowercase())
        };

        if found {
            debug!("Assertion passed: '{}' found in text", substring);
            return Ok(());
        }

        let failure = AssertionFailure::new(
            "assert_contains",
            format!(
                "assert_contains failed: substring not found.\nSearching for: '{}'\nIn text: '{}'\nCase sensitive: {}",
                substring, text, case_sensitive
            ),
            text,
            format!("contains '{}'", substring),
        )
        .with_diagnostics(json!({
            "text": text,
            "substring": substring,
            "case_sensitive": case_sensitive,
        }));
        self.fail(failure, "Contains Assertion Failure")
    }

    pub fn assert_list_contains<T: PartialEq + Debug>(&self, items: &[T], item: &T) -> AssertResult {
        if items.contains(item) {
            debug!("Assertion passed: {:?} found in list", item);
            return Ok(());
        }

        let failure = AssertionFailure::new(
            "assert_list_contains",
            format!(
                "assert_list_contains failed: item not found in list.\nLooking for: {:?}\nIn list: {:?}",
                item, items
            ),
            format!("{:?}", items),
            format!("list containing {:?}", item),
        );
        self.fail(failure, "List Contains Assertion Failure")
    }

    /// Strict: equal values fail
    pub fn assert_greater_than(&self, actual: impl Into<f64>, threshold: impl Into<f64>) -> AssertResult {
        let (actual, threshold) = (actual.into(), threshold.into());
        if actual > threshold {
            debug!("Assertion passed: {} > {}", actual, threshold);
            return Ok(());
        }

        let failure = AssertionFailure::new(
            "assert_greater_than",
            format!(
                "assert_greater_than failed: value is not greater than threshold.\nActual: {}\nThreshold: {}\nDifference: {}",
                actual,
                threshold,
                actual - threshold
            ),
            actual.to_string(),
            format!("> {}", threshold),
        )
        .with_diagnostics(json!({
            "actual": actual,
            "threshold": threshold,
            "difference": actual - threshold,
        }));
        self.fail(failure, "Greater Than Assertion Failure")
    }

    /// Strict: equal values fail
    pub fn assert_less_than(&self, actual: impl Into<f64>, threshold: impl Into<f64>) -> AssertResult {
        let (actual, threshold) = (actual.into(), threshold.into());
        if actual < threshold {
            debug!("Assertion passed: {} < {}", actual, threshold);
            return Ok(());
        }

        let failure = AssertionFailure::new(
            "assert_less_than",
            format!(
                "assert_less_than failed: value is not less than threshold.\nActual: {}\nThreshold: {}\nDifference: {}",
                actual,
                threshold,
                actual - threshold
            ),
            actual.to_string(),
            format!("< {}", threshold),
        )
        .with_diagnostics(json!({
            "actual": actual,
            "threshold": threshold,
            "difference": actual - threshold,
        }));
        self.fail(failure, "Less Than Assertion Failure")
    }

    /// Status equality; the body, when given, is attached and quoted on failure
    pub fn assert_status_code(&self, actual: u16, expected: u16, body: Option<&str>) -> AssertResult {
        if actual == expected {
            debug!("Assertion passed: status code {}", actual);
            return Ok(());
        }

        let mut message = format!(
            "assert_status_code failed: HTTP status code mismatch.\nExpected: {}\nActual: {}",
            expected, actual
        );
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            message.push_str(&format!("\nResponse body: {}", body));
            match serde_json::from_str::<Value>(body) {
                Ok(value) => self.reporter.attach_json("Response Body", &value),
                Err(_) => self.reporter.attach_text("Response Body", body),
            }
        }

        let failure = AssertionFailure::new(
            "assert_status_code",
            message,
            actual.to_string(),
            expected.to_string(),
        );
        self.fail(failure, "Status Code Assertion Failure")
    }

    /// Fails only when `actual_ms` exceeds `max_ms`; the boundary passes
    pub fn assert_response_time(&self, actual_ms: f64, max_ms: f64) -> AssertResult {
        if actual_ms <= max_ms {
            debug!("Assertion passed: response time {:.2}ms within {:.2}ms", actual_ms, max_ms);
            return Ok(());
        }

        let failure = AssertionFailure::new(
            "assert_response_time",
            format!(
                "assert_response_time failed: response time exceeded limit.\nActual: {:.2}ms\nLimit: {:.2}ms\nExceeded by: {:.2}ms",
                actual_ms,
                max_ms,
                actual_ms - max_ms
            ),
            format!("{:.2}ms", actual_ms),
            format!("<= {:.2}ms", max_ms),
        )
        .with_diagnostics(json!({
            "actual_ms": actual_ms,
            "max_ms": max_ms,
            "exceeded_by_ms": actual_ms - max_ms,
        }));
        self.fail(failure, "Response Time Assertion Failure")
    }

    /// Report a failure detected outside the named assertions
    pub fn fail_with(&self, failure: AssertionFailure) -> AssertResult {
        self.fail(failure, "Check Failure Details")
    }

    fn fail(&self, failure: AssertionFailure, attachment: &str) -> AssertResult {
        error!(operation = %failure.operation, "Assertion failed: {}", failure.message);
        self.reporter.attach_text(
            attachment,
            &format!(
                "Operation: {}\nExpected: {}\nActual: {}",
                failure.operation, failure.expected, failure.actual
            ),
        );
        Err(failure)
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}
