//! Declarative YAML scenarios

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SuiteError};

/// Route used when a distance check does not name one
pub const DEFAULT_ROUTE: &str = "kix_to_nrt";

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Skipped scenarios are reported but not executed
    #[serde(default)]
    pub skip: bool,

    /// Checks to execute in order
    pub checks: Vec<Check>,
}

/// A single verification step.
///
/// Thresholds left unset are read from the fixture data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    /// Listing returns the expected number of airports, each with id, type,
    /// name and attributes
    AirportCount {
        #[serde(default)]
        expected: Option<usize>,
    },

    /// Named airports are present
    AirportsExist {
        #[serde(default)]
        names: Option<Vec<String>>,
    },

    /// Named airports carry every critical attribute
    AirportAttributes {
        #[serde(default)]
        names: Option<Vec<String>>,
        #[serde(default)]
        fields: Option<Vec<String>>,
    },

    /// Names match exactly and not in lower case
    CaseSensitivity {
        #[serde(default)]
        names: Option<Vec<String>>,
    },

    /// Repeated listings agree on the count
    CountConsistency {
        #[serde(default = "default_requests")]
        requests: usize,
        #[serde(default)]
        expected: Option<usize>,
    },

    /// Listing completes within the budget
    ListResponseTime {
        #[serde(default)]
        max_ms: Option<f64>,
    },

    /// Distance lies strictly between the route bounds
    DistanceRange {
        #[serde(default = "default_route")]
        route: String,
        #[serde(default)]
        min_km: Option<f64>,
        #[serde(default)]
        max_km: Option<f64>,
    },

    /// Miles and nautical miles agree with kilometres
    DistanceUnits {
        #[serde(default = "default_route")]
        route: String,
        #[serde(default)]
        tolerance: Option<f64>,
    },

    /// Both directions give the same distance
    DistanceBidirectional {
        #[serde(default = "default_route")]
        route: String,
        #[serde(default = "default_bidirectional_tolerance")]
        tolerance_km: f64,
    },

    /// Distance calculation completes within the budget
    DistanceResponseTime {
        #[serde(default = "default_route")]
        route: String,
        #[serde(default)]
        max_ms: Option<f64>,
    },

    /// An unknown airport code is refused
    InvalidCodeRejected {
        #[serde(default = "default_error_scenario")]
        scenario: String,
        #[serde(default = "default_valid_code")]
        valid_code: String,
    },

    /// Lookup by IATA code finds the airport
    LookupByCode {
        code: String,
        #[serde(default)]
        expected_name: Option<String>,
    },
}

fn default_requests() -> usize {
    3
}

fn default_route() -> String {
    DEFAULT_ROUTE.to_string()
}

fn default_bidirectional_tolerance() -> f64 {
    0.001 // one metre
}

fn default_error_scenario() -> String {
    "invalid_airport_code".to_string()
}

fn default_valid_code() -> String {
    "KIX".to_string()
}

impl Check {
    /// The `check:` tag of this step
    pub fn kind(&self) -> &'static str {
        match self {
            Check::AirportCount { .. } => "airport_count",
            Check::AirportsExist { .. } => "airports_exist",
            Check::AirportAttributes { .. } => "airport_attributes",
            Check::CaseSensitivity { .. } => "case_sensitivity",
            Check::CountConsistency { .. } => "count_consistency",
            Check::ListResponseTime { .. } => "list_response_time",
            Check::DistanceRange { .. } => "distance_range",
            Check::DistanceUnits { .. } => "distance_units",
            Check::DistanceBidirectional { .. } => "distance_bidirectional",
            Check::DistanceResponseTime { .. } => "distance_response_time",
            Check::InvalidCodeRejected { .. } => "invalid_code_rejected",
            Check::LookupByCode { .. } => "lookup_by_code",
        }
    }
}

impl ScenarioSpec {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(SuiteError::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| SuiteError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, ordered by file path
    pub fn load_all(dir: &Path) -> Result<Vec<Self>> {
        if !dir.is_dir() {
            return Err(SuiteError::ScenarioDirMissing(dir.display().to_string()));
        }

        let mut specs = Vec::new();
        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test]
    fn test_parse_scenario_with_defaults() {
        let yaml = r#"
name: distance-kix-nrt
description: KIX to NRT distance
tags: [api, smoke]
checks:
  - check: distance_range
  - check: distance_units
    tolerance: 0.01
  - check: distance_bidirectional
  - check: invalid_code_rejected
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "distance-kix-nrt");
        assert!(!spec.skip);
        assert_eq!(spec.checks.len(), 4);
        assert_eq!(
            spec.checks[0],
            Check::DistanceRange {
                route: "kix_to_nrt".to_string(),
                min_km: None,
                max_km: None
            }
        );
        assert_eq!(
            spec.checks[2],
            Check::DistanceBidirectional {
                route: "kix_to_nrt".to_string(),
                tolerance_km: 0.001
            }
        );
        assert_eq!(
            spec.checks[3],
            Check::InvalidCodeRejected {
                scenario: "invalid_airport_code".to_string(),
                valid_code: "KIX".to_string()
            }
        );
    }

    #[test]
    fn test_parse_airport_checks() {
        let yaml = r#"
name: airports
checks:
  - check: airport_count
    expected: 30
  - check: airports_exist
    names: [Akureyri]
  - check: count_consistency
  - check: lookup_by_code
    code: KEF
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        let kinds: Vec<&str> = spec.checks.iter().map(Check::kind).collect();
        assert_eq!(
            kinds,
            vec!["airport_count", "airports_exist", "count_consistency", "lookup_by_code"]
        );
        assert_eq!(
            spec.checks[2],
            Check::CountConsistency {
                requests: 3,
                expected: None
            }
        );
    }

    #[test_case("airport_count")]
    #[test_case("airports_exist")]
    #[test_case("airport_attributes")]
    #[test_case("case_sensitivity")]
    #[test_case("count_consistency")]
    #[test_case("list_response_time")]
    #[test_case("distance_range")]
    #[test_case("distance_units")]
    #[test_case("distance_bidirectional")]
    #[test_case("distance_response_time")]
    #[test_case("invalid_code_rejected")]
    fn test_kind_matches_tag(tag: &str) {
        let yaml = format!("name: t\nchecks:\n  - check: {}\n", tag);
        let spec = ScenarioSpec::from_yaml(&yaml).unwrap();
        assert_eq!(spec.checks[0].kind(), tag);
    }

    #[test]
    fn test_unknown_check_is_rejected() {
        let yaml = "name: bad\nchecks:\n  - check: teleport\n";
        assert!(ScenarioSpec::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_all_and_filter() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("b.yaml"),
            "name: b\ntags: [regression]\nchecks: []\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join("a.yml"), "name: a\ntags: [smoke]\nchecks: []\n").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let specs = ScenarioSpec::load_all(tmp.path()).unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let smoke = ScenarioSpec::filter_by_tag(&specs, "smoke");
        assert_eq!(smoke.len(), 1);
        assert_eq!(smoke[0].name, "a");
    }

    #[test]
    fn test_load_all_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let err = ScenarioSpec::load_all(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, SuiteError::ScenarioDirMissing(_)));
    }
}
