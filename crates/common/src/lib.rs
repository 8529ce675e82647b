//! gatecheck common library
//!
//! Shared types for verifying the AirportGap API: the error taxonomy, domain
//! entities, the normalised response model, assertions, settings, fixture data
//! and report attachments.

pub mod assertions;
pub mod config;
pub mod data;
pub mod error;
pub mod reporting;
pub mod response;
pub mod types;

// Re-export commonly used types
pub use assertions::{AssertContext, AssertResult, AssertionFailure, AssertionHelper};
pub use config::{ApiSettings, LogFormat, RunSettings, Settings};
pub use data::{
    AirportExpectations, DataLoader, DistanceExpectation, ErrorScenario, PerformanceExpectations,
};
pub use error::{Error, Result};
pub use reporting::{AttachmentKind, DirectoryReporter, MemoryReporter, NullReporter, ReportSink};
pub use response::{ApiResponse, HttpMethod, ResponseBody, TransportResponse};
pub use types::*;

/// gatecheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default settings file name
pub const DEFAULT_CONFIG_FILE: &str = "gatecheck.toml";
