//! Wire records to domain entities

use gatecheck_common::{Airport, DistanceCalculation, Error, Result};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Distance attributes the API must report
pub const DISTANCE_FIELDS: [&str; 3] = ["kilometers", "miles", "nautical_miles"];

/// Map a list of airport records, dropping the ones that do not fit
pub fn map_airports(records: &[Value]) -> Vec<Airport> {
    let airports: Vec<Airport> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match map_airport(record) {
            Ok(airport) => Some(airport),
            Err(e) => {
                warn!("Skipping airport record {}: {}", index, e);
                None
            }
        })
        .collect();

    if airports.len() != records.len() {
        warn!(
            "Mapped {} of {} airport records",
            airports.len(),
            records.len()
        );
    } else {
        debug!("Mapped {} airport records", airports.len());
    }
    airports
}

/// Map a single airport record
pub fn map_airport(record: &Value) -> Result<Airport> {
    let object = record
        .as_object()
        .ok_or_else(|| Error::Shape(format!("airport record must be an object, got {}", record)))?;

    let id = text_field(object, "id")?;
    let kind = text_field(object, "type")?;
    let attributes = match object.get("attributes") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return Err(Error::Shape(format!(
                "airport attributes must be an object, got {}",
                other
            )))
        }
    };

    Ok(Airport::new(id, kind, attributes))
}

fn text_field(object: &Map<String, Value>, key: &str) -> Result<String> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(Error::Shape(format!(
            "airport '{}' must be a string, got {}",
            key, other
        ))),
    }
}

/// Map the `data` member of a distance response.
///
/// Endpoints come from `relationships.{from,to}.data` when present and fall
/// back to the codes the caller asked for.
pub fn map_distance(data: &Value, from_code: &str, to_code: &str) -> Result<DistanceCalculation> {
    let attributes = match data.get("attributes").and_then(Value::as_object) {
        Some(attributes) => attributes,
        None => {
            return Err(Error::MissingDistanceFields {
                missing: DISTANCE_FIELDS.iter().map(|f| f.to_string()).collect(),
            })
        }
    };

    let missing: Vec<String> = DISTANCE_FIELDS
        .iter()
        .filter(|field| !attributes.contains_key(**field))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingDistanceFields { missing });
    }

    Ok(DistanceCalculation {
        from_airport: endpoint(data, "from", from_code),
        to_airport: endpoint(data, "to", to_code),
        kilometers: coerce_f64(attributes, "kilometers")?,
        miles: coerce_f64(attributes, "miles")?,
        nautical_miles: coerce_f64(attributes, "nautical_miles")?,
    })
}

fn endpoint(data: &Value, side: &str, code: &str) -> Airport {
    let related = data.pointer(&format!("/relationships/{}/data", side));
    let id = related
        .and_then(|r| r.get("id"))
        .and_then(Value::as_str)
        .unwrap_or(code);
    let kind = related
        .and_then(|r| r.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("airport");
    Airport::placeholder(id, kind, code)
}

fn coerce_f64(attributes: &Map<String, Value>, field: &str) -> Result<f64> {
    let value = attributes.get(field).unwrap_or(&Value::Null);
    let coerced = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    coerced.ok_or_else(|| Error::Coercion {
        field: field.to_string(),
        value: value.to_string(),
    })
}
