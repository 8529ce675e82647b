//! Run Command

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use gatecheck_api::Transport;
use gatecheck_common::{Settings, TestStatus};
use gatecheck_suite::{RunnerConfig, ScenarioResult, SuiteRunner};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::Outcome;
use crate::output::{notice, print_list, Notice, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Directory of scenario YAML files (overrides settings)
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Only run scenarios carrying this tag
    #[arg(long, conflicts_with = "name")]
    pub tag: Option<String>,

    /// Only run the scenario with this name
    #[arg(long)]
    pub name: Option<String>,

    /// Do not write report attachments
    #[arg(long)]
    pub no_attachments: bool,
}

/// Scenario result display wrapper for serialization
#[derive(Serialize)]
pub struct ScenarioDisplay {
    pub name: String,
    pub status: TestStatus,
    pub checks: usize,
    pub duration_ms: u64,
    pub correlation_id: String,
    pub error: Option<String>,
}

impl From<&ScenarioResult> for ScenarioDisplay {
    fn from(result: &ScenarioResult) -> Self {
        Self {
            name: result.name.clone(),
            status: result.status,
            checks: result.checks.len(),
            duration_ms: result.duration_ms,
            correlation_id: result.correlation_id.clone(),
            error: result.error.clone(),
        }
    }
}

fn status_label(status: TestStatus) -> String {
    match status {
        TestStatus::Passed => "✓ passed".green().to_string(),
        TestStatus::Failed => "✗ failed".red().to_string(),
        TestStatus::Broken => "! broken".yellow().to_string(),
        TestStatus::Skipped => "- skipped".dimmed().to_string(),
    }
}

impl TableDisplay for ScenarioDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Status", "Checks", "Duration", "Correlation", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            status_label(self.status),
            self.checks.to_string(),
            format!("{}ms", self.duration_ms),
            self.correlation_id.clone(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

pub fn execute(args: RunArgs, settings: &Settings, transport: Arc<dyn Transport>, format: OutputFormat) -> Result<Outcome> {
    let mut config = RunnerConfig::from_settings(settings);
    if let Some(dir) = args.scenarios {
        config.scenarios_dir = dir;
    }
    config.write_attachments = !args.no_attachments;

    let runner = SuiteRunner::new(config, transport);

    let suite = match (args.tag, args.name) {
        (_, Some(name)) => runner.run_named(&name)?,
        (Some(tag), None) => runner.run_tagged(&tag)?,
        (None, None) => runner.run_all()?,
    };

    let rows: Vec<ScenarioDisplay> = suite.results.iter().map(ScenarioDisplay::from).collect();
    print_list(&rows, format);

    let path = runner.write_results(&suite)?;
    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        let summary = format!(
            "{} passed, {} failed, {} broken, {} skipped in {}ms. Results: {}",
            suite.passed,
            suite.failed,
            suite.broken,
            suite.skipped,
            suite.duration_ms,
            path.display()
        );
        notice(Notice::Summary, &summary);
    }

    Ok(Outcome::from_success(suite.success()))
}
