//! API session setup

use anyhow::{Context, Result};
use gatecheck_api::{AirportsClient, ApiClient, ReplayTransport, ReqwestTransport, Transport};
use gatecheck_common::{ApiSettings, NullReporter, TestContext};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Build the transport: canned responses when a replay file is given, HTTP otherwise
pub fn transport(replay: Option<&Path>) -> Result<Arc<dyn Transport>> {
    match replay {
        Some(path) => {
            info!("Replaying responses from {}", path.display());
            let replay = ReplayTransport::from_file(path)
                .with_context(|| format!("Failed to load replay file {}", path.display()))?;
            Ok(Arc::new(replay))
        }
        None => Ok(Arc::new(ReqwestTransport::new()?)),
    }
}

/// AirportGap client for one-off commands
pub fn airports_client(transport: Arc<dyn Transport>, settings: &ApiSettings, command: &str) -> AirportsClient {
    let api = ApiClient::new(
        transport,
        settings.clone(),
        TestContext::new(command),
        Arc::new(NullReporter),
    );
    AirportsClient::new(api)
}
