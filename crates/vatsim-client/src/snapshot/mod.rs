// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! VATSIM data-feed snapshot document types.
//!
//! Mirrors the subset of the v3 JSON document this library consumes. The
//! feed is advisory, untyped external data: optional fields deserialize
//! to `None` and unknown fields are ignored.

use serde::Deserialize;

/// One connected air-traffic controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Controller {
    /// Station callsign, underscore-delimited facility/position tokens
    /// (e.g. "EGLL_N_TWR").
    pub callsign: String,

    /// Controller's display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Primary frequency as published by the feed.
    #[serde(default)]
    pub frequency: Option<String>,
}

/// Filed route endpoints for a connected pilot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlightPlan {
    /// Departure airport ICAO code.
    pub departure: String,

    /// Arrival airport ICAO code.
    pub arrival: String,
}

/// One connected pilot with kinematic state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pilot {
    /// Current latitude in degrees.
    pub latitude: f64,

    /// Current longitude in degrees.
    pub longitude: f64,

    /// Ground speed in knots; absent for some client connections.
    #[serde(default)]
    pub groundspeed: Option<f64>,

    /// Altitude in feet; absent for some client connections.
    #[serde(default)]
    pub altitude: Option<f64>,

    /// Filed flight plan, if any.
    #[serde(default)]
    pub flight_plan: Option<FlightPlan>,
}

impl Pilot {
    /// True when the pilot filed both a departure and an arrival code.
    #[must_use]
    pub fn has_route(&self) -> bool {
        self.flight_plan
            .as_ref()
            .is_some_and(|plan| !plan.departure.is_empty() && !plan.arrival.is_empty())
    }
}

/// Top-level snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    /// Connected controllers.
    #[serde(default)]
    pub controllers: Vec<Controller>,

    /// Connected pilots.
    #[serde(default)]
    pub pilots: Vec<Pilot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snapshot_document() {
        let document = r#"{
            "general": { "version": 3, "update_timestamp": "2025-06-01T12:00:00Z" },
            "controllers": [
                { "callsign": "EGLL_N_TWR", "name": "Heathrow Tower", "frequency": "118.700", "cid": 123456 },
                { "callsign": "LON_S_CTR" }
            ],
            "pilots": [
                {
                    "latitude": 51.15, "longitude": -0.18,
                    "groundspeed": 140, "altitude": 2500,
                    "flight_plan": { "departure": "EGKK", "arrival": "EGCC", "aircraft": "B738" }
                },
                { "latitude": 48.0, "longitude": 2.5 }
            ]
        }"#;

        let snapshot: Snapshot = serde_json::from_str(document).unwrap();
        assert_eq!(snapshot.controllers.len(), 2);
        assert_eq!(snapshot.controllers[0].name.as_deref(), Some("Heathrow Tower"));
        assert_eq!(snapshot.controllers[1].name, None);
        assert_eq!(snapshot.controllers[1].frequency, None);

        assert_eq!(snapshot.pilots.len(), 2);
        assert_eq!(snapshot.pilots[0].groundspeed, Some(140.0));
        assert!(snapshot.pilots[0].has_route());
        assert_eq!(snapshot.pilots[1].groundspeed, None);
        assert_eq!(snapshot.pilots[1].altitude, None);
        assert!(!snapshot.pilots[1].has_route());
    }

    #[test]
    fn test_parse_empty_collections() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.controllers.is_empty());
        assert!(snapshot.pilots.is_empty());
    }

    #[test]
    fn test_route_with_empty_endpoint_is_unusable() {
        let pilot = Pilot {
            latitude: 51.0,
            longitude: 0.0,
            groundspeed: Some(400.0),
            altitude: Some(35000.0),
            flight_plan: Some(FlightPlan {
                departure: String::new(),
                arrival: "EGLL".to_string(),
            }),
        };
        assert!(!pilot.has_route());
    }
}
