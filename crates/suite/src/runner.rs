//! Suite runner that executes scenarios against the AirportGap API

use chrono::{DateTime, Utc};
use gatecheck_api::{AirportsClient, ApiClient, Transport};
use gatecheck_common::{
    ApiSettings, DataLoader, DirectoryReporter, NullReporter, ReportSink, Settings, TestContext,
    TestStatus,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::checks::CheckExecutor;
use crate::error::{Result, SuiteError};
use crate::scenario::ScenarioSpec;

/// Name of the results file written into the output directory
pub const RESULTS_FILE: &str = "suite-results.json";

/// Result of a single check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub category: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub correlation_id: String,
    pub status: TestStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub checks: Vec<CheckResult>,
    pub error: Option<String>,
}

impl ScenarioResult {
    pub fn success(&self) -> bool {
        matches!(self.status, TestStatus::Passed | TestStatus::Skipped)
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub broken: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.broken == 0
    }
}

/// Configuration for the suite runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub api: ApiSettings,
    pub data_dir: PathBuf,
    pub scenarios_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Write report attachments under `<output_dir>/attachments`
    pub write_attachments: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl RunnerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api: settings.airportgap.clone(),
            data_dir: settings.test.data_dir.clone(),
            scenarios_dir: settings.test.scenarios_dir.clone(),
            output_dir: settings.test.results_dir.clone(),
            write_attachments: true,
        }
    }
}

/// Runs declarative scenarios
pub struct SuiteRunner {
    config: RunnerConfig,
    transport: Arc<dyn Transport>,
    data: DataLoader,
}

impl SuiteRunner {
    pub fn new(config: RunnerConfig, transport: Arc<dyn Transport>) -> Self {
        let data = DataLoader::new(&config.data_dir);
        Self {
            config,
            transport,
            data,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run all scenarios in the scenarios directory
    pub fn run_all(&self) -> Result<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.scenarios_dir)?;
        Ok(self.run_specs(&specs))
    }

    /// Run scenarios matching a tag
    pub fn run_tagged(&self, tag: &str) -> Result<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.scenarios_dir)?;
        let filtered: Vec<ScenarioSpec> = ScenarioSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        Ok(self.run_specs(&filtered))
    }

    /// Run a specific scenario by name
    pub fn run_test(&self, name: &str) -> Result<ScenarioResult> {
        let spec = self.find_spec(name)?;
        Ok(self.run_spec(&spec))
    }

    /// Run a specific scenario by name as a one-scenario suite
    pub fn run_named(&self, name: &str) -> Result<SuiteResult> {
        let spec = self.find_spec(name)?;
        Ok(self.run_specs(std::slice::from_ref(&spec)))
    }

    fn find_spec(&self, name: &str) -> Result<ScenarioSpec> {
        ScenarioSpec::load_all(&self.config.scenarios_dir)?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| SuiteError::ScenarioNotFound(name.to_string()))
    }

    /// Run a list of scenarios
    pub fn run_specs(&self, specs: &[ScenarioSpec]) -> SuiteResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(specs.len());
        let (mut passed, mut failed, mut broken, mut skipped) = (0, 0, 0, 0);

        info!("Running {} scenario(s)...", specs.len());

        for spec in specs {
            let result = self.run_spec(spec);
            match result.status {
                TestStatus::Passed => {
                    passed += 1;
                    info!("✓ {} ({} ms)", result.name, result.duration_ms);
                }
                TestStatus::Skipped => {
                    skipped += 1;
                    info!("- {} (skipped)", result.name);
                }
                TestStatus::Failed => {
                    failed += 1;
                    error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
                }
                TestStatus::Broken => {
                    broken += 1;
                    error!("! {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
                }
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Suite results: {} passed, {} failed, {} broken, {} skipped ({} ms)",
            passed, failed, broken, skipped, duration_ms
        );

        SuiteResult {
            total: specs.len(),
            passed,
            failed,
            broken,
            skipped,
            duration_ms,
            results,
        }
    }

    /// Run a single scenario; stops at the first failing check
    pub fn run_spec(&self, spec: &ScenarioSpec) -> ScenarioResult {
        let start = Instant::now();
        let mut context = TestContext::new(&spec.name);
        debug!(correlation_id = %context.correlation_id, "Running scenario: {}", spec.name);

        if spec.skip {
            context.finish(TestStatus::Skipped, None);
            return self.scenario_result(&context, start, Vec::new());
        }

        let reporter: Arc<dyn ReportSink> = if self.config.write_attachments {
            Arc::new(DirectoryReporter::new(
                self.config.output_dir.join("attachments"),
                context.correlation_id.clone(),
            ))
        } else {
            Arc::new(NullReporter)
        };
        let api = ApiClient::new(
            self.transport.clone(),
            self.config.api.clone(),
            context.clone(),
            reporter,
        );
        let airports = AirportsClient::new(api);
        let executor = CheckExecutor::new(&airports, &self.data);

        let mut checks = Vec::with_capacity(spec.checks.len());
        let mut outcome = (TestStatus::Passed, None);

        for check in &spec.checks {
            let check_start = Instant::now();
            let result = executor.execute(check);
            let duration_ms = check_start.elapsed().as_millis() as u64;

            match result {
                Ok(()) => checks.push(CheckResult {
                    check: check.kind().to_string(),
                    success: true,
                    duration_ms,
                    error: None,
                    category: None,
                }),
                Err(e) => {
                    let status = if e.is_verification_failure() {
                        TestStatus::Failed
                    } else {
                        TestStatus::Broken
                    };
                    warn!(
                        correlation_id = %context.correlation_id,
                        category = e.category(),
                        "Check {} in {} failed: {}", check.kind(), spec.name, e
                    );
                    checks.push(CheckResult {
                        check: check.kind().to_string(),
                        success: false,
                        duration_ms,
                        error: Some(e.to_string()),
                        category: Some(e.category().to_string()),
                    });
                    outcome = (status, Some(format!("{}: {}", check.kind(), e)));
                    break;
                }
            }
        }

        context.finish(outcome.0, outcome.1);
        self.scenario_result(&context, start, checks)
    }

    fn scenario_result(&self, context: &TestContext, start: Instant, checks: Vec<CheckResult>) -> ScenarioResult {
        ScenarioResult {
            name: context.test_name.clone(),
            correlation_id: context.correlation_id.clone(),
            status: context.status.unwrap_or(TestStatus::Broken),
            started_at: context.started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            checks,
            error: context.error_message.clone(),
        }
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join(RESULTS_FILE);
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
