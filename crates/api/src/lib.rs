//! gatecheck API clients
//!
//! Clients for the AirportGap HTTP API on top of a pluggable [`Transport`].
//!
//! ```text
//! AirportsClient ──> ApiClient ──> dyn Transport ──> ReqwestTransport (HTTP)
//!      │                 │                      └──> ReplayTransport (canned)
//!      └─ mapper         └─ ApiResponse, AssertionHelper, ReportSink
//! ```

pub mod airports;
pub mod client;
pub mod mapper;
pub mod transport;

pub use airports::AirportsClient;
pub use client::{ApiClient, RequestOptions};
pub use transport::{ReplayEntry, ReplayTransport, ReqwestTransport, Transport, TransportRequest};
