//! Core types for gatecheck

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::assertions::AssertionFailure;

/// Kilometres to statute miles
pub const KM_TO_MILES: f64 = 0.621371;

/// Kilometres to nautical miles
pub const KM_TO_NAUTICAL_MILES: f64 = 0.539957;

/// Allowed relative deviation between reported units
pub const UNIT_TOLERANCE: f64 = 0.05;

/// An airport record from the AirportGap API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Airport {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Airport {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            attributes,
        }
    }

    /// Placeholder for a distance endpoint that only knows the IATA code
    pub fn placeholder(id: impl Into<String>, kind: impl Into<String>, iata: &str) -> Self {
        let mut attributes = Map::new();
        attributes.insert("iata".to_string(), Value::String(iata.to_string()));
        Self::new(id, kind, attributes)
    }

    pub fn name(&self) -> &str {
        self.text_attribute("name")
    }

    pub fn city(&self) -> &str {
        self.text_attribute("city")
    }

    pub fn country(&self) -> &str {
        self.text_attribute("country")
    }

    pub fn iata_code(&self) -> &str {
        self.text_attribute("iata")
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// True when the attribute exists and is not null, empty, or false
    pub fn has_attribute(&self, key: &str) -> bool {
        match self.attributes.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::Number(_)) => true,
        }
    }

    fn text_attribute(&self, key: &str) -> &str {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Distance between two airports in three units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceCalculation {
    pub from_airport: Airport,
    pub to_airport: Airport,
    pub kilometers: f64,
    pub miles: f64,
    pub nautical_miles: f64,
}

/// Relative deviation of each unit from its expected conversion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitDeviations {
    pub miles: f64,
    pub nautical_miles: f64,
}

impl DistanceCalculation {
    pub fn is_valid_distance(&self) -> bool {
        self.kilometers > 0.0 && self.miles > 0.0 && self.nautical_miles > 0.0
    }

    /// `None` when kilometres is not positive and ratios are undefined
    pub fn unit_deviations(&self) -> Option<UnitDeviations> {
        if self.kilometers <= 0.0 {
            return None;
        }
        Some(UnitDeviations {
            miles: (self.miles / self.kilometers - KM_TO_MILES).abs() / KM_TO_MILES,
            nautical_miles: (self.nautical_miles / self.kilometers - KM_TO_NAUTICAL_MILES).abs()
                / KM_TO_NAUTICAL_MILES,
        })
    }

    /// Checks that miles and nautical miles are conversions of the kilometre value.
    ///
    /// `tolerance` is relative to the conversion factor, so `0.05` accepts a
    /// miles/km ratio within 5% of 0.621371.
    pub fn verify_unit_consistency(&self, tolerance: f64) -> Result<(), AssertionFailure> {
        let Some(deviations) = self.unit_deviations() else {
            return Ok(());
        };

        let mut offending = Vec::new();
        if deviations.miles > tolerance {
            offending.push(format!(
                "miles ({} vs expected {:.3})",
                self.miles,
                self.kilometers * KM_TO_MILES
            ));
        }
        if deviations.nautical_miles > tolerance {
            offending.push(format!(
                "nautical_miles ({} vs expected {:.3})",
                self.nautical_miles,
                self.kilometers * KM_TO_NAUTICAL_MILES
            ));
        }

        if offending.is_empty() {
            return Ok(());
        }

        Err(AssertionFailure::check(
            "assert_unit_consistency",
            format_args!(
                "distance units are inconsistent with {} km: {}",
                self.kilometers,
                offending.join(", ")
            ),
            format!("{:?}", deviations),
            format!("relative deviation <= {}", tolerance),
        ))
    }
}

/// Outcome of a single test execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Broken,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
            TestStatus::Skipped => write!(f, "skipped"),
            TestStatus::Broken => write!(f, "broken"),
        }
    }
}

/// Execution context carried through one test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestContext {
    pub correlation_id: String,
    pub test_name: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: Option<TestStatus>,
    pub error_message: Option<String>,
}

impl TestContext {
    pub fn new(test_name: impl Into<String>) -> Self {
        let mut correlation_id = Uuid::new_v4().simple().to_string();
        correlation_id.truncate(8);
        Self {
            correlation_id,
            test_name: test_name.into(),
            started_at: Some(Utc::now()),
            finished_at: None,
            status: None,
            error_message: None,
        }
    }

    /// Record the end of the test
    pub fn finish(&mut self, status: TestStatus, error_message: Option<String>) {
        self.finished_at = Some(Utc::now());
        self.status = Some(status);
        self.error_message = error_message;
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
