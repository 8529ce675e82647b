//! Fixture data source
//!
//! Expectations (counts, required names, thresholds) live in YAML or JSON
//! files under the data directory. Lookups are read-only; a missing key is a
//! configuration error for the calling test.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::{Error, Result};

/// File holding the AirportGap expectations
pub const API_EXPECTATIONS_FILE: &str = "api_expected.yaml";

/// Root key of the AirportGap section
pub const AIRPORTGAP_SECTION: &str = "airportgap_api";

/// Expected airport listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportExpectations {
    pub total_count: usize,
    pub required_airports: Vec<String>,
    #[serde(default)]
    pub optional_fields: Vec<String>,
}

/// Expected distance for a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceExpectation {
    pub from_code: String,
    pub to_code: String,
    pub min_distance_km: f64,
    pub max_distance_km: f64,
    #[serde(default)]
    pub description: String,
}

/// Response time budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceExpectations {
    pub max_list_response_time_ms: f64,
    #[serde(alias = "max_distance_calc_time_ms")]
    pub max_distance_response_time_ms: f64,
}

/// An input the API is expected to reject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorScenario {
    pub code: String,
    #[serde(default)]
    pub expected_status: Option<u16>,
    #[serde(default)]
    pub description: String,
}

/// Loads fixture files with a read-through cache
#[derive(Debug)]
pub struct DataLoader {
    base_path: PathBuf,
    cache: Mutex<HashMap<String, Value>>,
}

impl DataLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Load a whole file; `.yaml`, `.yml` and `.json` are recognised
    pub fn load(&self, filename: &str) -> Result<Value> {
        if let Some(cached) = self.cache.lock().get(filename) {
            debug!("Loading cached fixture data: {}", filename);
            return Ok(cached.clone());
        }

        let path = self.base_path.join(filename);
        debug!("Loading fixture file: {}", path.display());

        let content = std::fs::read_to_string(&path).map_err(|e| {
            error!("Fixture file not readable: {}: {}", path.display(), e);
            e
        })?;

        let value: Value = if filename.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        self.cache.lock().insert(filename.to_string(), value.clone());
        info!("Loaded fixture data: {}", filename);
        Ok(value)
    }

    /// Look up a dotted key path such as `airportgap_api.airports.total_count`
    pub fn lookup(&self, filename: &str, key: &str) -> Result<Value> {
        let root = self.load(filename)?;
        let mut current = &root;
        for segment in key.split('.') {
            match current.get(segment) {
                Some(next) => current = next,
                None => {
                    let available = current
                        .as_object()
                        .map(|o| o.keys().cloned().collect())
                        .unwrap_or_default();
                    error!("Fixture key '{}' not found in {}", key, filename);
                    return Err(Error::MissingFixture {
                        file: filename.to_string(),
                        key: key.to_string(),
                        available,
                    });
                }
            }
        }
        Ok(current.clone())
    }

    /// Look up and deserialise a key path
    pub fn get<T: DeserializeOwned>(&self, filename: &str, key: &str) -> Result<T> {
        let value = self.lookup(filename, key)?;
        serde_json::from_value(value).map_err(|e| {
            Error::InvalidConfig(format!("{} in {}: {}", key, filename, e))
        })
    }

    pub fn airport_expectations(&self) -> Result<AirportExpectations> {
        self.get(API_EXPECTATIONS_FILE, &format!("{}.airports", AIRPORTGAP_SECTION))
    }

    pub fn distance_expectation(&self, route: &str) -> Result<DistanceExpectation> {
        self.get(
            API_EXPECTATIONS_FILE,
            &format!("{}.distance_calculations.{}", AIRPORTGAP_SECTION, route),
        )
    }

    pub fn performance_expectations(&self) -> Result<PerformanceExpectations> {
        self.get(
            API_EXPECTATIONS_FILE,
            &format!("{}.performance_expectations", AIRPORTGAP_SECTION),
        )
    }

    pub fn error_scenario(&self, name: &str) -> Result<ErrorScenario> {
        self.get(
            API_EXPECTATIONS_FILE,
            &format!("{}.error_scenarios.{}", AIRPORTGAP_SECTION, name),
        )
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
        debug!("Fixture cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXPECTED: &str = r#"
airportgap_api:
  airports:
    total_count: 30
    required_airports:
      - Akureyri
      - St. Anthony
      - CFB Bagotville
    optional_fields: [city, country, iata]
  distance_calculations:
    kix_to_nrt:
      from_code: KIX
      to_code: NRT
      min_distance_km: 400
      max_distance_km: 600
      description: Osaka Kansai to Tokyo Narita
  performance_expectations:
    max_list_response_time_ms: 5000
    max_distance_response_time_ms: 5000
  error_scenarios:
    invalid_airport_code:
      code: ZZZ
      expected_status: 422
"#;

    fn loader() -> (TempDir, DataLoader) {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(API_EXPECTATIONS_FILE), EXPECTED).unwrap();
        let loader = DataLoader::new(tmp.path());
        (tmp, loader)
    }

    #[test]
    fn test_typed_views() {
        let (_tmp, loader) = loader();

        let airports = loader.airport_expectations().unwrap();
        assert_eq!(airports.total_count, 30);
        assert_eq!(airports.required_airports.len(), 3);
        assert_eq!(airports.optional_fields, vec!["city", "country", "iata"]);

        let route = loader.distance_expectation("kix_to_nrt").unwrap();
        assert_eq!(route.from_code, "KIX");
        assert_eq!(route.min_distance_km, 400.0);

        let perf = loader.performance_expectations().unwrap();
        assert_eq!(perf.max_list_response_time_ms, 5000.0);

        let scenario = loader.error_scenario("invalid_airport_code").unwrap();
        assert_eq!(scenario.code, "ZZZ");
        assert_eq!(scenario.expected_status, Some(422));
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let (_tmp, loader) = loader();
        let err = loader.distance_expectation("lhr_to_jfk").unwrap_err();
        match err {
            Error::MissingFixture { key, available, .. } => {
                assert_eq!(key, "airportgap_api.distance_calculations.lhr_to_jfk");
                assert_eq!(available, vec!["kix_to_nrt".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cache_serves_after_file_removed() {
        let (tmp, loader) = loader();
        loader.lookup(API_EXPECTATIONS_FILE, "airportgap_api").unwrap();
        std::fs::remove_file(tmp.path().join(API_EXPECTATIONS_FILE)).unwrap();

        let count: usize = loader
            .get(API_EXPECTATIONS_FILE, "airportgap_api.airports.total_count")
            .unwrap();
        assert_eq!(count, 30);

        loader.clear_cache();
        assert!(matches!(
            loader.load(API_EXPECTATIONS_FILE),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_json_fixtures() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("users.json"), r#"{"standard_user": {"username": "standard_user"}}"#).unwrap();
        let loader = DataLoader::new(tmp.path());
        let name: String = loader.get("users.json", "standard_user.username").unwrap();
        assert_eq!(name, "standard_user");
    }
}
