//! Check execution
//!
//! Each [`Check`] runs against an [`AirportsClient`] and the fixture data. A
//! check either passes or returns the first error it hit; evidence goes to
//! the client's report sink.

use gatecheck_api::AirportsClient;
use gatecheck_common::{
    AssertContext, AssertionFailure, DataLoader, DistanceExpectation, Error, Result,
    UNIT_TOLERANCE,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info};

use crate::scenario::Check;

/// Attributes an airport cannot do without
pub const CRITICAL_FIELDS: [&str; 5] = ["name", "id", "iata", "city", "country"];

/// Runs checks for one scenario
pub struct CheckExecutor<'a> {
    airports: &'a AirportsClient,
    data: &'a DataLoader,
}

impl<'a> CheckExecutor<'a> {
    pub fn new(airports: &'a AirportsClient, data: &'a DataLoader) -> Self {
        Self { airports, data }
    }

    pub fn execute(&self, check: &Check) -> Result<()> {
        debug!("Executing check: {}", check.kind());
        match check {
            Check::AirportCount { expected } => self.airport_count(*expected),
            Check::AirportsExist { names } => self.airports_exist(names.as_deref()),
            Check::AirportAttributes { names, fields } => {
                self.airport_attributes(names.as_deref(), fields.as_deref())
            }
            Check::CaseSensitivity { names } => self.case_sensitivity(names.as_deref()),
            Check::CountConsistency { requests, expected } => {
                self.count_consistency(*requests, *expected)
            }
            Check::ListResponseTime { max_ms } => self.list_response_time(*max_ms),
            Check::DistanceRange {
                route,
                min_km,
                max_km,
            } => self.distance_range(route, *min_km, *max_km),
            Check::DistanceUnits { route, tolerance } => {
                self.distance_units(route, tolerance.unwrap_or(UNIT_TOLERANCE))
            }
            Check::DistanceBidirectional {
                route,
                tolerance_km,
            } => self.distance_bidirectional(route, *tolerance_km),
            Check::DistanceResponseTime { route, max_ms } => {
                self.distance_response_time(route, *max_ms)
            }
            Check::InvalidCodeRejected {
                scenario,
                valid_code,
            } => self.invalid_code_rejected(scenario, valid_code),
            Check::LookupByCode {
                code,
                expected_name,
            } => self.lookup_by_code(code, expected_name.as_deref()),
        }
    }

    fn expected_count(&self, expected: Option<usize>) -> Result<usize> {
        match expected {
            Some(count) => Ok(count),
            None => Ok(self.data.airport_expectations()?.total_count),
        }
    }

    fn required_names(&self, names: Option<&[String]>) -> Result<Vec<String>> {
        match names {
            Some(names) => Ok(names.to_vec()),
            None => Ok(self.data.airport_expectations()?.required_airports),
        }
    }

    fn route(&self, route: &str) -> Result<DistanceExpectation> {
        self.data.distance_expectation(route)
    }

    fn fail(&self, failure: AssertionFailure) -> Result<()> {
        Ok(self.airports.api().assertions().fail_with(failure)?)
    }

    fn airport_count(&self, expected: Option<usize>) -> Result<()> {
        let expected = self.expected_count(expected)?;
        let airports = self.airports.get_all_airports()?;
        let assertions = self.airports.api().assertions();

        assertions
            .assert_equals(airports.len(), expected)
            .context(format!(
                "Expected exactly {} airports from API, but received {} airports",
                expected,
                airports.len()
            ))?;

        let incomplete: Vec<_> = airports
            .iter()
            .enumerate()
            .filter_map(|(index, airport)| {
                let mut missing = Vec::new();
                if airport.id.is_empty() {
                    missing.push("id");
                }
                if airport.kind.is_empty() {
                    missing.push("type");
                }
                if airport.name().is_empty() {
                    missing.push("name");
                }
                if airport.attributes.is_empty() {
                    missing.push("attributes");
                }
                (!missing.is_empty()).then(|| {
                    json!({"index": index, "airport_id": airport.id, "missing_fields": missing})
                })
            })
            .collect();

        self.airports.api().reporter().attach_json(
            "Airport Data Validation Results",
            &json!({
                "total_airports_validated": airports.len(),
                "airports_with_missing_data": incomplete.len(),
                "missing_data_details": incomplete.iter().take(10).collect::<Vec<_>>(),
            }),
        );

        if !incomplete.is_empty() {
            return self.fail(AssertionFailure::check(
                "airport_count",
                format_args!(
                    "found {} airports with missing required data. First few examples: {}",
                    incomplete.len(),
                    json!(incomplete.iter().take(5).collect::<Vec<_>>())
                ),
                format!("{} incomplete", incomplete.len()),
                "every airport has id, type, name and attributes",
            ));
        }
        Ok(())
    }

    fn airports_exist(&self, names: Option<&[String]>) -> Result<()> {
        let names = self.required_names(names)?;
        self.airports.verify_airports_exist(names.as_slice())?;
        Ok(())
    }

    fn airport_attributes(&self, names: Option<&[String]>, fields: Option<&[String]>) -> Result<()> {
        let names = self.required_names(names)?;
        let fields = match fields {
            Some(fields) => fields.to_vec(),
            None => self.data.airport_expectations()?.optional_fields,
        };

        let airports = self.airports.get_all_airports()?;
        let found: Vec<_> = airports
            .iter()
            .filter(|a| names.iter().any(|n| n == a.name()))
            .collect();

        let missing_names: Vec<String> = names
            .iter()
            .filter(|n| !found.iter().any(|a| a.name() == n.as_str()))
            .cloned()
            .collect();
        if !missing_names.is_empty() {
            return Err(Error::MissingEntities {
                missing: missing_names,
                available: airports.iter().map(|a| a.name().to_string()).collect(),
            });
        }

        let mut validation = Vec::new();
        let mut issues = Vec::new();
        for airport in &found {
            let mut missing_fields = Vec::new();
            if airport.name().is_empty() {
                missing_fields.push("name".to_string());
            }
            if airport.id.is_empty() {
                missing_fields.push("id".to_string());
            }
            for field in &fields {
                if !airport.has_attribute(field) {
                    missing_fields.push(field.clone());
                }
            }

            let critical: Vec<&String> = missing_fields
                .iter()
                .filter(|f| CRITICAL_FIELDS.contains(&f.as_str()))
                .collect();
            if !critical.is_empty() {
                issues.push(json!({"airport": airport.name(), "critical_missing": critical}));
            }
            validation.push(json!({
                "name": airport.name(),
                "id": airport.id,
                "attribute_count": airport.attributes.len(),
                "missing_fields": missing_fields,
            }));
        }

        self.airports.api().reporter().attach_json(
            "Airport Attribute Validation",
            &json!({
                "required_airports_count": found.len(),
                "validation_results": validation,
            }),
        );

        if !issues.is_empty() {
            return self.fail(AssertionFailure::check(
                "airport_attributes",
                "required airports are missing critical information",
                json!(issues).to_string(),
                format!("all of {:?} present", CRITICAL_FIELDS),
            ));
        }
        Ok(())
    }

    fn case_sensitivity(&self, names: Option<&[String]>) -> Result<()> {
        let names = self.required_names(names)?;
        let available = self.airports.get_airport_names()?;
        let assertions = self.airports.api().assertions();

        let mut results = Vec::new();
        for name in &names {
            let lower = name.to_lowercase();
            let exact = available.contains(name);
            let lowercase = available.contains(&lower);
            results.push(json!({
                "airport": name,
                "exact_match": exact,
                "lowercase_match": lowercase,
            }));

            assertions
                .assert_equals(exact, true)
                .context(format!("Airport '{}' should be found with exact case matching", name))?;
            if *name != lower {
                assertions
                    .assert_equals(lowercase, false)
                    .context(format!("Airport '{}' should not match lowercase version", name))?;
            }
        }

        self.airports
            .api()
            .reporter()
            .attach_json("Case Sensitivity Test Results", &json!(results));
        Ok(())
    }

    fn count_consistency(&self, requests: usize, expected: Option<usize>) -> Result<()> {
        if requests < 1 {
            return Err(Error::InvalidConfig(
                "count_consistency needs at least 1 request".to_string(),
            ));
        }

        let mut counts = Vec::with_capacity(requests);
        for i in 0..requests {
            let count = self.airports.get_airports_count()?;
            debug!("Request {} of {}: {} airports", i + 1, requests, count);
            counts.push(count);
        }

        self.airports.api().reporter().attach_json(
            "Multiple Request Results",
            &json!({"number_of_requests": requests, "counts": counts}),
        );

        let unique: BTreeSet<usize> = counts.iter().copied().collect();
        if unique.len() > 1 {
            return self.fail(AssertionFailure::check(
                "count_consistency",
                format_args!(
                    "airport count is inconsistent across {} requests, got {:?}",
                    requests, unique
                ),
                format!("{:?}", counts),
                "the same count for every request",
            ));
        }

        let Some(&consistent) = counts.first() else {
            return Ok(());
        };
        let expected = self.expected_count(expected)?;
        self.airports
            .api()
            .assertions()
            .assert_equals(consistent, expected)
            .context(format!(
                "Consistent count {} does not match expected count {}",
                consistent, expected
            ))?;
        Ok(())
    }

    fn list_response_time(&self, max_ms: Option<f64>) -> Result<()> {
        let max_ms = match max_ms {
            Some(max) => max,
            None => self.data.performance_expectations()?.max_list_response_time_ms,
        };

        let start = Instant::now();
        let airports = self.airports.get_all_airports()?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.airports.api().reporter().attach_json(
            "Performance Test Results",
            &json!({
                "response_time_ms": elapsed_ms,
                "max_allowed_ms": max_ms,
                "airports_count": airports.len(),
            }),
        );

        self.airports
            .api()
            .assertions()
            .assert_response_time(elapsed_ms, max_ms)
            .context(format!(
                "API response time {:.2}ms exceeds maximum allowed time {}ms",
                elapsed_ms, max_ms
            ))?;
        Ok(())
    }

    fn distance_range(&self, route: &str, min_km: Option<f64>, max_km: Option<f64>) -> Result<()> {
        let expectation = self.route(route)?;
        let min_km = min_km.unwrap_or(expectation.min_distance_km);
        let max_km = max_km.unwrap_or(expectation.max_distance_km);
        let (from, to) = (&expectation.from_code, &expectation.to_code);

        let distance = self.airports.calculate_distance(from, to)?;
        let assertions = self.airports.api().assertions();

        assertions
            .assert_greater_than(distance.kilometers, min_km)
            .context(format!(
                "Distance between {} and {} ({:.2} km) should be greater than {} km",
                from, to, distance.kilometers, min_km
            ))?;
        assertions
            .assert_less_than(distance.kilometers, max_km)
            .context(format!(
                "Distance between {} and {} ({:.2} km) should be less than {} km",
                from, to, distance.kilometers, max_km
            ))?;
        assertions
            .assert_equals(distance.is_valid_distance(), true)
            .context("Distance calculation should have valid positive values for all units")?;

        info!("{} to {} is {:.2} km", from, to, distance.kilometers);
        Ok(())
    }

    fn distance_units(&self, route: &str, tolerance: f64) -> Result<()> {
        let expectation = self.route(route)?;
        let distance = self
            .airports
            .calculate_distance(&expectation.from_code, &expectation.to_code)?;

        match distance.verify_unit_consistency(tolerance) {
            Ok(()) => Ok(()),
            Err(failure) => self.fail(failure),
        }
    }

    fn distance_bidirectional(&self, route: &str, tolerance_km: f64) -> Result<()> {
        let expectation = self.route(route)?;
        let (a, b) = (&expectation.from_code, &expectation.to_code);

        let forward = self.airports.calculate_distance(a, b)?;
        let backward = self.airports.calculate_distance(b, a)?;
        let difference = (forward.kilometers - backward.kilometers).abs();

        self.airports.api().reporter().attach_json(
            "Bidirectional Distance Comparison",
            &json!({
                "direction_1": format!("{} to {}", a, b),
                "distance_1_km": forward.kilometers,
                "direction_2": format!("{} to {}", b, a),
                "distance_2_km": backward.kilometers,
                "difference_km": difference,
            }),
        );

        self.airports
            .api()
            .assertions()
            .assert_less_than(difference, tolerance_km)
            .context(format!(
                "Distance should be the same in both directions. {} to {}: {:.3} km, {} to {}: {:.3} km",
                a, b, forward.kilometers, b, a, backward.kilometers
            ))?;
        Ok(())
    }

    fn distance_response_time(&self, route: &str, max_ms: Option<f64>) -> Result<()> {
        let expectation = self.route(route)?;
        let max_ms = match max_ms {
            Some(max) => max,
            None => self.data.performance_expectations()?.max_distance_response_time_ms,
        };

        let start = Instant::now();
        let distance = self
            .airports
            .calculate_distance(&expectation.from_code, &expectation.to_code)?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.airports.api().reporter().attach_json(
            "Distance Calculation Performance",
            &json!({
                "response_time_ms": elapsed_ms,
                "max_allowed_ms": max_ms,
                "distance_calculated_km": distance.kilometers,
            }),
        );

        self.airports
            .api()
            .assertions()
            .assert_response_time(elapsed_ms, max_ms)
            .context(format!(
                "Distance calculation response time {:.2}ms exceeds maximum allowed time {}ms",
                elapsed_ms, max_ms
            ))?;
        Ok(())
    }

    fn invalid_code_rejected(&self, scenario: &str, valid_code: &str) -> Result<()> {
        let scenario = self.data.error_scenario(scenario)?;
        let invalid = scenario.code.as_str();

        let reporter = self.airports.api().reporter();
        match self.airports.calculate_distance(invalid, valid_code) {
            Ok(distance) => {
                reporter.attach_json(
                    "Unexpected Success with Invalid Code",
                    &json!({
                        "from_code": invalid,
                        "to_code": valid_code,
                        "distance_km": distance.kilometers,
                    }),
                );
                self.fail(AssertionFailure::check(
                    "invalid_code_rejected",
                    format_args!(
                        "invalid airport code '{}' got a successful response with distance {} km",
                        invalid, distance.kilometers
                    ),
                    format!("{} km", distance.kilometers),
                    "an error response",
                ))
            }
            Err(e) if e.category() == "TransportError" => Err(e),
            Err(e) => {
                reporter.attach_json(
                    "Invalid Airport Code Error Handling",
                    &json!({
                        "from_code": invalid,
                        "to_code": valid_code,
                        "category": e.category(),
                        "error_message": e.to_string(),
                    }),
                );
                match (&e, scenario.expected_status) {
                    (Error::StatusMismatch { actual, .. }, Some(expected)) if *actual != expected => {
                        self.fail(AssertionFailure::check(
                            "invalid_code_rejected",
                            format_args!("invalid airport code '{}' was rejected with the wrong status", invalid),
                            format!("status {}", actual),
                            format!("status {}", expected),
                        ))
                    }
                    _ => {
                        info!("Invalid airport code '{}' rejected: {}", invalid, e);
                        Ok(())
                    }
                }
            }
        }
    }

    fn lookup_by_code(&self, code: &str, expected_name: Option<&str>) -> Result<()> {
        let Some(airport) = self.airports.get_airport_by_iata_code(code) else {
            return self.fail(AssertionFailure::check(
                "lookup_by_code",
                format_args!("no airport found for IATA code '{}'", code),
                "no match",
                format!("an airport with IATA code '{}'", code),
            ));
        };

        if let Some(expected) = expected_name {
            self.airports
                .api()
                .assertions()
                .assert_equals(airport.name(), expected)
                .context(format!("Airport {} has an unexpected name", code))?;
        }
        Ok(())
    }
}
