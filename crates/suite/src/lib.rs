//! gatecheck suite runner
//!
//! Runs declarative YAML scenarios against the AirportGap API and records
//! the outcome of every check.
//!
//! ```text
//! ScenarioSpec (YAML)             SuiteRunner
//!   ├── name, description, tags     ├── run_all / run_tagged / run_named / run_test
//!   ├── skip                        ├── run_spec(spec) -> ScenarioResult
//!   └── checks: [Check]             └── write_results(SuiteResult)
//!         ├── airport_count / airports_exist / airport_attributes
//!         ├── case_sensitivity / count_consistency / list_response_time
//!         ├── distance_range / distance_units / distance_bidirectional
//!         ├── distance_response_time / invalid_code_rejected
//!         └── lookup_by_code
//! ```

pub mod checks;
pub mod error;
pub mod runner;
pub mod scenario;

pub use error::{Result, SuiteError};
pub use runner::{CheckResult, RunnerConfig, ScenarioResult, SuiteResult, SuiteRunner};
pub use scenario::{Check, ScenarioSpec};
