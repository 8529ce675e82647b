//! Distance Command

use anyhow::Result;
use clap::Args;
use gatecheck_api::AirportsClient;
use gatecheck_common::{AssertContext, DistanceCalculation};
use serde::Serialize;

use super::Outcome;
use crate::output::{notice, print_item, Notice, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct DistanceArgs {
    /// Origin IATA code
    pub from: String,

    /// Destination IATA code
    pub to: String,

    /// Fail unless the distance is strictly greater than this many kilometres
    #[arg(long)]
    pub min_km: Option<f64>,
}

/// Distance display wrapper for serialization
#[derive(Serialize)]
pub struct DistanceDisplay {
    pub from: String,
    pub to: String,
    pub kilometers: f64,
    pub miles: f64,
    pub nautical_miles: f64,
}

impl From<&DistanceCalculation> for DistanceDisplay {
    fn from(distance: &DistanceCalculation) -> Self {
        Self {
            from: distance.from_airport.iata_code().to_string(),
            to: distance.to_airport.iata_code().to_string(),
            kilometers: distance.kilometers,
            miles: distance.miles,
            nautical_miles: distance.nautical_miles,
        }
    }
}

impl TableDisplay for DistanceDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["From", "To", "Kilometers", "Miles", "Nautical Miles"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.from.clone(),
            self.to.clone(),
            format!("{:.2}", self.kilometers),
            format!("{:.2}", self.miles),
            format!("{:.2}", self.nautical_miles),
        ]
    }
}

pub fn execute(args: DistanceArgs, client: &AirportsClient, format: OutputFormat) -> Result<Outcome> {
    let (from, to) = (args.from.as_str(), args.to.as_str());

    let distance = client.calculate_distance(from, to)?;
    print_item(&DistanceDisplay::from(&distance), format);

    if let Some(min_km) = args.min_km {
        client
            .api()
            .assertions()
            .assert_greater_than(distance.kilometers, min_km)
            .context(format!(
                "Distance between {} and {} ({:.2} km) should be greater than {} km",
                from, to, distance.kilometers, min_km
            ))
            .map_err(gatecheck_common::Error::from)?;
        notice(Notice::Ok, &format!("{} to {} is longer than {} km", from, to, min_km));
    }

    Ok(Outcome::Passed)
}
