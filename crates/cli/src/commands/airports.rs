//! Airport Commands

use anyhow::Result;
use clap::Subcommand;
use gatecheck_api::AirportsClient;
use gatecheck_common::{Airport, Error};
use serde::Serialize;

use super::Outcome;
use crate::output::{notice, print_item, print_list, Notice, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum AirportsCommands {
    /// List all airports
    List,

    /// Print the number of airports
    Count,

    /// Print the non-empty airport names
    Names,

    /// Verify that airports with the given names exist
    Verify {
        /// Airport names, matched exactly
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Look up an airport by IATA code
    Lookup {
        /// IATA code (case-insensitive)
        code: String,
    },
}

/// Airport display wrapper for serialization
#[derive(Serialize)]
pub struct AirportDisplay {
    pub id: String,
    pub name: String,
    pub iata: String,
    pub city: String,
    pub country: String,
}

impl From<&Airport> for AirportDisplay {
    fn from(airport: &Airport) -> Self {
        Self {
            id: airport.id.clone(),
            name: airport.name().to_string(),
            iata: airport.iata_code().to_string(),
            city: airport.city().to_string(),
            country: airport.country().to_string(),
        }
    }
}

impl TableDisplay for AirportDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "IATA", "City", "Country"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.iata.clone(),
            self.city.clone(),
            self.country.clone(),
        ]
    }
}

/// Existence check row
#[derive(Serialize)]
pub struct ExistenceDisplay {
    pub name: String,
    pub found: bool,
}

impl TableDisplay for ExistenceDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Found"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            if self.found { "✓" } else { "✗" }.to_string(),
        ]
    }
}

/// Airport count row
#[derive(Serialize)]
pub struct CountDisplay {
    pub count: usize,
}

impl TableDisplay for CountDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Airports"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.count.to_string()]
    }
}

/// Name-only row
#[derive(Serialize)]
#[serde(transparent)]
pub struct NameDisplay(pub String);

impl TableDisplay for NameDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.0.clone()]
    }
}

pub fn execute(cmd: AirportsCommands, client: &AirportsClient, format: OutputFormat) -> Result<Outcome> {
    match cmd {
        AirportsCommands::List => {
            let airports = client.get_all_airports()?;
            let displays: Vec<AirportDisplay> = airports.iter().map(AirportDisplay::from).collect();
            print_list(&displays, format);
        }

        AirportsCommands::Count => {
            let count = client.get_airports_count()?;
            print_item(&CountDisplay { count }, format);
        }

        AirportsCommands::Names => {
            let names: Vec<NameDisplay> = client
                .get_airport_names()?
                .into_iter()
                .map(NameDisplay)
                .collect();
            print_list(&names, format);
        }

        AirportsCommands::Verify { names } => match client.verify_airports_exist(names.as_slice()) {
            Ok(found) => {
                let rows: Vec<ExistenceDisplay> = found
                    .into_iter()
                    .map(|(name, found)| ExistenceDisplay { name, found })
                    .collect();
                print_list(&rows, format);
                notice(Notice::Ok, &format!("All {} airport(s) found", rows.len()));
            }
            Err(Error::MissingEntities { missing, .. }) => {
                let rows: Vec<ExistenceDisplay> = names
                    .iter()
                    .map(|name| ExistenceDisplay {
                        name: name.clone(),
                        found: !missing.contains(name),
                    })
                    .collect();
                print_list(&rows, format);
                notice(Notice::Failed, &format!("Missing airport(s): {}", missing.join(", ")));
                return Ok(Outcome::Failed);
            }
            Err(e) => return Err(e.into()),
        },

        AirportsCommands::Lookup { code } => match client.get_airport_by_iata_code(&code) {
            Some(airport) => print_item(&AirportDisplay::from(&airport), format),
            None => {
                notice(Notice::Failed, &format!("No airport found for IATA code '{}'", code));
                return Ok(Outcome::Failed);
            }
        },
    }

    Ok(Outcome::Passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_airport_row_uses_empty_defaults() {
        let airport: Airport = serde_json::from_value(json!({
            "id": "GKA",
            "type": "airport",
            "attributes": {"name": "Goroka", "iata": "GKA"}
        }))
        .unwrap();

        let display = AirportDisplay::from(&airport);
        assert_eq!(
            display.row(),
            vec!["GKA", "Goroka", "GKA", "", ""]
        );
        assert_eq!(AirportDisplay::headers().len(), display.row().len());
    }

    #[test]
    fn test_name_display_serializes_as_string() {
        let names = vec![NameDisplay("Goroka".to_string())];
        assert_eq!(serde_json::to_value(&names).unwrap(), json!(["Goroka"]));
    }
}
