//! Settings
//!
//! Built once at start-up and handed to every client and runner that needs
//! them; nothing reads settings from global state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// AirportGap API configuration
    pub airportgap: ApiSettings,

    /// Test run configuration
    pub test: RunSettings,
}

/// AirportGap API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL relative request paths are joined to
    pub base_url: String,

    /// Request timeout in milliseconds
    pub api_timeout_ms: u64,

    /// Value of the User-Agent header
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://airportgap.com".to_string(),
            api_timeout_ms: 30_000,
            user_agent: format!("gatecheck/{}", crate::VERSION),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Test run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Logging level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Directory holding fixture files
    pub data_dir: PathBuf,

    /// Directory for suite results and attachments
    pub results_dir: PathBuf,

    /// Directory holding scenario specs
    pub scenarios_dir: PathBuf,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            data_dir: PathBuf::from("testdata"),
            results_dir: PathBuf::from("test-results"),
            scenarios_dir: PathBuf::from("scenarios"),
        }
    }
}

impl RunSettings {
    pub fn attachments_dir(&self) -> PathBuf {
        self.results_dir.join("attachments")
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let settings: Self = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AIRPORTGAP_BASE_URL") {
            self.airportgap.base_url = v;
        }
        if let Some(v) = lookup("AIRPORTGAP_API_TIMEOUT") {
            self.airportgap.api_timeout_ms = v.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("AIRPORTGAP_API_TIMEOUT must be milliseconds, got '{}'", v))
            })?;
        }
        if let Some(v) = lookup("AIRPORTGAP_USER_AGENT") {
            self.airportgap.user_agent = v;
        }
        if let Some(v) = lookup("TEST_LOG_LEVEL") {
            self.test.log_level = v.to_lowercase();
        }
        if let Some(v) = lookup("TEST_LOG_FORMAT") {
            self.test.log_format = match v.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                other => {
                    return Err(Error::InvalidConfig(format!(
                        "TEST_LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                        other
                    )))
                }
            };
        }
        if let Some(v) = lookup("TEST_DATA_DIR") {
            self.test.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TEST_RESULTS_DIR") {
            self.test.results_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TEST_SCENARIOS_DIR") {
            self.test.scenarios_dir = PathBuf::from(v);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let url = &self.airportgap.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "airportgap.base_url must be an http(s) URL, got '{}'",
                url
            )));
        }
        if self.airportgap.api_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "airportgap.api_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.airportgap.base_url, "https://airportgap.com");
        assert_eq!(settings.airportgap.timeout(), Duration::from_secs(30));
        assert_eq!(settings.test.log_level, "info");
        assert_eq!(settings.test.attachments_dir(), PathBuf::from("test-results/attachments"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gatecheck.toml");
        std::fs::write(
            &path,
            "[airportgap]\nbase_url = \"http://localhost:3000\"\n\n[test]\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.airportgap.base_url, "http://localhost:3000");
        assert_eq!(settings.airportgap.api_timeout_ms, 30_000);
        assert_eq!(settings.test.log_level, "debug");

        let out = tmp.path().join("nested/out.toml");
        settings.save(&out).unwrap();
        assert_eq!(Settings::load(&out).unwrap(), settings);
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::default()
            .apply_env_from(env(&[
                ("AIRPORTGAP_BASE_URL", "http://127.0.0.1:8080"),
                ("AIRPORTGAP_API_TIMEOUT", "5000"),
                ("TEST_LOG_LEVEL", "DEBUG"),
                ("TEST_LOG_FORMAT", "json"),
                ("TEST_RESULTS_DIR", "/tmp/results"),
            ]))
            .unwrap();

        assert_eq!(settings.airportgap.base_url, "http://127.0.0.1:8080");
        assert_eq!(settings.airportgap.api_timeout_ms, 5000);
        assert_eq!(settings.test.log_level, "debug");
        assert_eq!(settings.test.log_format, LogFormat::Json);
        assert_eq!(settings.test.results_dir, PathBuf::from("/tmp/results"));
    }

    #[test]
    fn test_invalid_env_overrides() {
        let err = Settings::default()
            .apply_env_from(env(&[("AIRPORTGAP_API_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Settings::default()
            .apply_env_from(env(&[("AIRPORTGAP_BASE_URL", "airportgap.com")]))
            .unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }
}
