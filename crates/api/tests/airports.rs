//! AirportsClient behaviour against replayed AirportGap responses

use gatecheck_api::{AirportsClient, ApiClient, ReplayTransport};
use gatecheck_common::{ApiSettings, Error, HttpMethod, MemoryReporter, TestContext};
use serde_json::{json, Value};
use std::sync::Arc;

const BASE_URL: &str = "https://airportgap.com";

fn airport_record(index: usize, name: &str, iata: &str) -> Value {
    json!({
        "id": iata,
        "type": "airport",
        "attributes": {
            "name": name,
            "city": format!("City {}", index),
            "country": "Iceland",
            "iata": iata,
        }
    })
}

/// Thirty airports, the first three being the ones the suite requires
fn thirty_airports() -> Value {
    let mut records = vec![
        airport_record(0, "Akureyri", "AEY"),
        airport_record(1, "St. Anthony", "YAY"),
        airport_record(2, "CFB Bagotville", "YBG"),
    ];
    for i in 3..30 {
        let code = format!("A{:02}", i);
        records.push(airport_record(i, &format!("Airport {}", i), &code));
    }
    json!({ "data": records, "links": {} })
}

fn distance_body() -> Value {
    json!({
        "data": {
            "id": "KIX-NRT",
            "type": "airport_distance",
            "attributes": {
                "kilometers": 490.8,
                "miles": 304.9,
                "nautical_miles": 264.9
            },
            "relationships": {
                "from": {"data": {"id": "KIX", "type": "airport"}},
                "to": {"data": {"id": "NRT", "type": "airport"}}
            }
        }
    })
}

fn setup(transport: ReplayTransport) -> (Arc<ReplayTransport>, Arc<MemoryReporter>, AirportsClient) {
    let transport = Arc::new(transport);
    let reporter = Arc::new(MemoryReporter::new());
    let settings = ApiSettings {
        base_url: BASE_URL.to_string(),
        ..Default::default()
    };
    let api = ApiClient::new(
        transport.clone(),
        settings,
        TestContext::new("airports"),
        reporter.clone(),
    );
    (transport, reporter, AirportsClient::new(api))
}

#[test]
fn test_get_all_airports_maps_every_record() {
    let (transport, reporter, client) =
        setup(ReplayTransport::new().respond_json(HttpMethod::Get, "/api/airports", 200, thirty_airports()));

    let airports = client.get_all_airports().unwrap();
    assert_eq!(airports.len(), 30);
    assert_eq!(airports[0].name(), "Akureyri");
    assert_eq!(airports[0].iata_code(), "AEY");

    let requests = transport.requests();
    assert_eq!(requests[0].url, "https://airportgap.com/api/airports");
    assert!(reporter.find("Airports API Response").is_some());
}

#[test]
fn test_count_and_names() {
    let (_, _, client) =
        setup(ReplayTransport::new().respond_json(HttpMethod::Get, "/api/airports", 200, thirty_airports()));

    assert_eq!(client.get_airports_count().unwrap(), 30);
    let names = client.get_airport_names().unwrap();
    assert_eq!(names.len(), 30);
    assert!(names.contains(&"CFB Bagotville".to_string()));
}

#[test]
fn test_names_skip_blank_entries() {
    let body = json!({"data": [
        {"id": "1", "type": "airport", "attributes": {"name": "Goroka"}},
        {"id": "2", "type": "airport", "attributes": {"name": ""}},
        {"id": "3", "type": "airport", "attributes": {}},
    ]});
    let (_, _, client) = setup(ReplayTransport::new().respond_json(HttpMethod::Get, "/api/airports", 200, body));
    assert_eq!(client.get_airport_names().unwrap(), vec!["Goroka".to_string()]);
}

#[test]
fn test_listing_requires_data_list() {
    let (_, _, client) = setup(ReplayTransport::new().respond_json(
        HttpMethod::Get,
        "/api/airports",
        200,
        json!({"data": {"id": "1"}}),
    ));
    let err = client.get_all_airports().unwrap_err();
    assert!(matches!(err, Error::Shape(ref m) if m.contains("object")));
}

#[test]
fn test_listing_status_mismatch() {
    let (_, _, client) = setup(ReplayTransport::new().respond(
        HttpMethod::Get,
        "/api/airports",
        500,
        "Internal Server Error",
    ));
    let err = client.get_all_airports().unwrap_err();
    assert!(matches!(err, Error::StatusMismatch { expected: 200, actual: 500, .. }));
}

#[test]
fn test_verify_airports_exist_passes() {
    let (_, reporter, client) =
        setup(ReplayTransport::new().respond_json(HttpMethod::Get, "/api/airports", 200, thirty_airports()));

    let results = client
        .verify_airports_exist(&["Akureyri", "St. Anthony", "CFB Bagotville"])
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.values().all(|found| *found));

    let bundle = reporter.find("Airport Existence Verification").unwrap().json().unwrap();
    assert_eq!(bundle["total_available_airports"], json!(30));
}

#[test]
fn test_verify_airports_exist_lists_exactly_the_missing() {
    let (_, _, client) =
        setup(ReplayTransport::new().respond_json(HttpMethod::Get, "/api/airports", 200, thirty_airports()));

    let err = client
        .verify_airports_exist(&["Akureyri", "Airport 7", "Zzyzx"])
        .unwrap_err();
    match err {
        Error::MissingEntities { missing, available } => {
            assert_eq!(missing, vec!["Zzyzx".to_string()]);
            assert_eq!(available.len(), 30);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_calculate_distance() {
    let (transport, reporter, client) = setup(ReplayTransport::new().respond_json(
        HttpMethod::Post,
        "/api/airports/distance",
        200,
        distance_body(),
    ));

    let distance = client.calculate_distance("KIX", "NRT").unwrap();
    assert_eq!(distance.kilometers, 490.8);
    assert!(distance.is_valid_distance());
    assert_eq!(distance.from_airport.iata_code(), "KIX");
    assert_eq!(distance.to_airport.iata_code(), "NRT");

    let request = &transport.requests()[0];
    assert_eq!(request.body, Some(json!({"from": "KIX", "to": "NRT"})));

    let results = reporter.find("Distance Calculation Results").unwrap().json().unwrap();
    assert_eq!(results["kilometers"], json!(490.8));
}

#[test]
fn test_calculate_distance_attaches_error() {
    let (_, reporter, client) = setup(ReplayTransport::new().respond_json(
        HttpMethod::Post,
        "/api/airports/distance",
        422,
        json!({"errors": [{"detail": "Please enter valid 'from' and 'to' airports."}]}),
    ));

    let err = client.calculate_distance("XXX", "NRT").unwrap_err();
    assert!(matches!(err, Error::StatusMismatch { actual: 422, .. }));

    let attachment = reporter.find("Distance Calculation Error").unwrap().json().unwrap();
    assert_eq!(attachment["from_airport"], json!("XXX"));
    assert_eq!(attachment["category"], json!("ShapeError"));
}

#[test]
fn test_calculate_distance_missing_fields() {
    let (_, _, client) = setup(ReplayTransport::new().respond_json(
        HttpMethod::Post,
        "/api/airports/distance",
        200,
        json!({"data": {"attributes": {"kilometers": 490.8}}}),
    ));
    let err = client.calculate_distance("KIX", "NRT").unwrap_err();
    assert_eq!(err.category(), "FieldError");
}

#[test]
fn test_verify_distance_greater_than() {
    let (_, reporter, client) = setup(ReplayTransport::new().respond_json(
        HttpMethod::Post,
        "/api/airports/distance",
        200,
        distance_body(),
    ));

    assert_eq!(client.verify_distance_greater_than("KIX", "NRT", 400.0).unwrap(), 490.8);

    let err = client.verify_distance_greater_than("KIX", "NRT", 500.0).unwrap_err();
    match err {
        Error::Assertion(failure) => {
            assert_eq!(failure.operation, "assert_greater_than");
            assert!(failure.message.starts_with("Distance between KIX and NRT"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(reporter.find("Greater Than Assertion Failure").is_some());
}

#[test]
fn test_lookup_by_iata_code_ignores_case() {
    let (_, _, client) =
        setup(ReplayTransport::new().respond_json(HttpMethod::Get, "/api/airports", 200, thirty_airports()));

    let airport = client.get_airport_by_iata_code("aey").unwrap();
    assert_eq!(airport.name(), "Akureyri");
    assert!(client.get_airport_by_iata_code("ZZZ").is_none());
}

#[test]
fn test_lookup_returns_none_on_transport_error() {
    let (_, _, client) =
        setup(ReplayTransport::new().fail(HttpMethod::Get, "/api/airports", "connection refused"));
    assert!(client.get_airport_by_iata_code("KIX").is_none());
}

#[test]
fn test_reporter_is_shared_with_client() {
    let (_, reporter, client) = setup(ReplayTransport::new());
    client.api().reporter().attach_text("note", "hello");
    assert_eq!(reporter.len(), 1);
}
