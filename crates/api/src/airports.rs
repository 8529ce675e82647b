//! AirportGap API operations
//!
//! Listing, existence checks, distance calculation and lookup by IATA code.
//! Every operation logs its boundaries and attaches the evidence it gathered
//! to the report sink.

use gatecheck_common::{Airport, AssertContext, DistanceCalculation, Error, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use crate::client::ApiClient;
use crate::mapper;

/// Airport listing endpoint
pub const AIRPORTS_PATH: &str = "/api/airports";

/// Distance calculation endpoint
pub const DISTANCE_PATH: &str = "/api/airports/distance";

/// Client for the airport endpoints
#[derive(Clone)]
pub struct AirportsClient {
    client: ApiClient,
}

impl AirportsClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn api(&self) -> &ApiClient {
        &self.client
    }

    /// Fetch and map every airport
    pub fn get_all_airports(&self) -> Result<Vec<Airport>> {
        info!(correlation_id = %self.client.correlation_id(), "Fetching all airports from AirportGap API");

        let airports = self.fetch_airports().map_err(|e| {
            error!(correlation_id = %self.client.correlation_id(), "Failed to get airports: {}", e);
            e
        })?;
        info!("Successfully retrieved {} airports", airports.len());
        Ok(airports)
    }

    fn fetch_airports(&self) -> Result<Vec<Airport>> {
        let response = self.client.get(AIRPORTS_PATH)?;
        self.client.verify_response_status(&response, 200)?;
        self.client.verify_response_contains_keys(&response, &["data"])?;

        let records = response
            .json_object()
            .and_then(|body| body.get("data"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                let found = response
                    .json_object()
                    .and_then(|body| body.get("data"))
                    .map(json_kind)
                    .unwrap_or("nothing");
                Error::Shape(format!("expected 'data' to be a list, got {}", found))
            })?;

        let airports = mapper::map_airports(records);

        if let Some(body) = response.json_object() {
            self.client
                .reporter()
                .attach_json("Airports API Response", &Value::Object(body.clone()));
        }
        Ok(airports)
    }

    pub fn get_airports_count(&self) -> Result<usize> {
        info!("Getting airports count");
        let count = self.get_all_airports()?.len();
        info!("Total airports count: {}", count);
        Ok(count)
    }

    /// Names of all airports, skipping blank ones
    pub fn get_airport_names(&self) -> Result<Vec<String>> {
        let names: Vec<String> = self
            .get_all_airports()?
            .iter()
            .map(Airport::name)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        debug!("Retrieved {} airport names", names.len());
        Ok(names)
    }

    /// Check that every required name is present.
    ///
    /// Returns the per-name result when all are found. Otherwise fails with
    /// `MissingEntities` carrying every missing name and every name the API
    /// returned.
    pub fn verify_airports_exist<S: AsRef<str>>(&self, required: &[S]) -> Result<BTreeMap<String, bool>> {
        let required: Vec<&str> = required.iter().map(AsRef::as_ref).collect();
        info!("Verifying airports exist: {:?}", required);

        let available = self.get_airport_names()?;
        let mut results = BTreeMap::new();
        let mut missing = Vec::new();

        for name in &required {
            let exists = available.iter().any(|a| a == name);
            results.insert(name.to_string(), exists);
            if exists {
                debug!("Airport found: {}", name);
            } else {
                warn!("Airport not found: {}", name);
                missing.push(name.to_string());
            }
        }

        self.client.reporter().attach_json(
            "Airport Existence Verification",
            &json!({
                "required_airports": required,
                "verification_results": results,
                "missing_airports": missing,
                "total_available_airports": available.len(),
            }),
        );

        if !missing.is_empty() {
            let err = Error::MissingEntities { missing, available };
            error!(correlation_id = %self.client.correlation_id(), "{}", err);
            return Err(err);
        }

        info!("All required airports verified: {:?}", required);
        Ok(results)
    }

    /// Distance between two airports by IATA code
    pub fn calculate_distance(&self, from: &str, to: &str) -> Result<DistanceCalculation> {
        info!(correlation_id = %self.client.correlation_id(), "Calculating distance from {} to {}", from, to);

        match self.fetch_distance(from, to) {
            Ok(distance) => Ok(distance),
            Err(e) => {
                error!(correlation_id = %self.client.correlation_id(), "Failed to calculate distance: {}", e);
                self.client.reporter().attach_json(
                    "Distance Calculation Error",
                    &json!({
                        "from_airport": from,
                        "to_airport": to,
                        "error": e.to_string(),
                        "category": e.category(),
                    }),
                );
                Err(e)
            }
        }
    }

    fn fetch_distance(&self, from: &str, to: &str) -> Result<DistanceCalculation> {
        let payload = json!({"from": from, "to": to});
        let response = self.client.post_json(DISTANCE_PATH, payload.clone())?;
        self.client.verify_response_status(&response, 200)?;
        self.client.verify_response_contains_keys(&response, &["data"])?;

        let data = response
            .json_object()
            .and_then(|body| body.get("data"))
            .cloned()
            .unwrap_or(Value::Null);
        let distance = mapper::map_distance(&data, from, to)?;

        info!(
            "Distance calculation successful: {:.2} km ({:.2} miles, {:.2} nm)",
            distance.kilometers, distance.miles, distance.nautical_miles
        );
        self.client.reporter().attach_json(
            "Distance Calculation Results",
            &json!({
                "from_airport": from,
                "to_airport": to,
                "kilometers": distance.kilometers,
                "miles": distance.miles,
                "nautical_miles": distance.nautical_miles,
                "request_payload": payload,
                "response_time_ms": response.duration_ms,
            }),
        );
        Ok(distance)
    }

    /// Calculate a distance and require it to exceed `min_km`; returns kilometres
    pub fn verify_distance_greater_than(&self, from: &str, to: &str, min_km: f64) -> Result<f64> {
        info!("Verifying distance {} to {} > {} km", from, to, min_km);
        let distance = self.calculate_distance(from, to)?;

        self.client
            .assertions()
            .assert_greater_than(distance.kilometers, min_km)
            .context(format!(
                "Distance between {} and {} should be greater than {} km",
                from, to, min_km
            ))?;

        info!(
            "Distance verification passed: {:.2} km > {} km",
            distance.kilometers, min_km
        );
        Ok(distance.kilometers)
    }

    /// Find an airport by IATA code, ignoring case.
    ///
    /// Failures to list airports are logged and reported as `None`.
    pub fn get_airport_by_iata_code(&self, code: &str) -> Option<Airport> {
        info!("Looking up airport by IATA code: {}", code);

        let airports = match self.get_all_airports() {
            Ok(airports) => airports,
            Err(e) => {
                warn!(
                    correlation_id = %self.client.correlation_id(),
                    category = e.category(),
                    "Airport lookup for {} failed: {}", code, e
                );
                return None;
            }
        };

        let found = airports
            .into_iter()
            .find(|airport| airport.iata_code().eq_ignore_ascii_case(code));
        match &found {
            Some(airport) => info!("Found airport: {} ({})", airport.name(), code),
            None => warn!("Airport not found for IATA code: {}", code),
        }
        found
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
