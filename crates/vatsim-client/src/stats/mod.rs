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

//! Airport reference index and per-snapshot movement aggregation.
//!
//! Stats are recomputed from scratch on every pass as a pure function of
//! the current pilot set and the static coordinate table; nothing is
//! carried over between passes.

use std::collections::HashMap;

use log::debug;

use crate::geo;
use crate::snapshot::Pilot;

/// Groundspeed below this (knots) counts toward the on-ground test.
const GROUND_MAX_GROUNDSPEED_KT: f64 = 20.0;

/// Altitude below this (feet) counts toward the on-ground test.
const GROUND_MAX_ALTITUDE_FT: f64 = 100.0;

/// Minimum groundspeed (knots) for the airborne arrival test.
///
/// Deliberately an independent boundary from the on-ground test: the two
/// predicates are not complements of each other.
const AIRBORNE_MIN_GROUNDSPEED_KT: f64 = 20.0;

/// Altitude (feet) that must be exceeded for the airborne arrival test.
const AIRBORNE_MIN_ALTITUDE_FT: f64 = 100.0;

/// Substituted for a missing groundspeed or altitude so that absent data
/// reads as airborne and high, never as on the ground.
const MISSING_KINEMATIC_SENTINEL: f64 = 9999.0;

/// Arrivals are only counted within this many estimated minutes out.
const ARRIVAL_WINDOW_MIN: f64 = 90.0;

/// Departure count above which an airport is flagged as busy.
const BUSY_DEPARTURE_THRESHOLD: u32 = 25;

/// A known airport's coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AirportLocation {
    /// Four-letter ICAO code.
    pub icao: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Lookup table from ICAO code to coordinates.
///
/// Built once at startup from reference data and immutable afterwards. A
/// repeated code overrides the earlier entry; this is a lookup table, not
/// an invariant-bearing set.
#[derive(Debug, Clone, Default)]
pub struct AirportIndex {
    locations: HashMap<String, AirportLocation>,
}

impl AirportIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from reference records.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = AirportLocation>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert(record);
        }
        index
    }

    /// Insert a record, replacing any earlier entry for the same code.
    pub fn insert(&mut self, location: AirportLocation) {
        self.locations.insert(location.icao.clone(), location);
    }

    /// Look up an airport by ICAO code.
    #[must_use]
    pub fn get(&self, icao: &str) -> Option<&AirportLocation> {
        self.locations.get(icao)
    }

    /// Number of known airports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the index holds no airports.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Arrival/departure counts for one airport over a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportStats {
    /// Airport ICAO code, uppercased.
    pub icao: String,
    /// Inbound flights estimated to land within the arrival window.
    pub arrivals: u32,
    /// Flights on the ground filed to depart from here.
    pub departures: u32,
}

impl AirportStats {
    fn new(icao: String) -> Self {
        Self {
            icao,
            arrivals: 0,
            departures: 0,
        }
    }

    /// Presentation flag only; plays no part in the counting rules.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.departures > BUSY_DEPARTURE_THRESHOLD
    }

    /// Total movements for this airport.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.arrivals + self.departures
    }
}

/// Recompute per-airport stats from scratch for the given pilot set.
///
/// Departures count pilots on the ground at a regional departure airport.
/// Arrivals count airborne pilots inbound to a known regional airport
/// whose estimated time to arrival at current groundspeed is inside the
/// 90-minute window. The result carries only airports that received at
/// least one increment, sorted by total movements descending; ties keep
/// first-encounter order.
#[must_use]
pub fn aggregate(pilots: &[Pilot], airports: &AirportIndex, region_prefix: &str) -> Vec<AirportStats> {
    let mut stats: Vec<AirportStats> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for pilot in pilots {
        let Some(plan) = pilot.flight_plan.as_ref() else {
            continue;
        };
        let departure = plan.departure.to_uppercase();
        let arrival = plan.arrival.to_uppercase();

        let groundspeed = pilot.groundspeed.unwrap_or(MISSING_KINEMATIC_SENTINEL);
        let altitude = pilot.altitude.unwrap_or(MISSING_KINEMATIC_SENTINEL);
        let on_ground = groundspeed < GROUND_MAX_GROUNDSPEED_KT || altitude < GROUND_MAX_ALTITUDE_FT;

        if departure.starts_with(region_prefix) && on_ground {
            entry_for(&mut stats, &mut slots, &departure).departures += 1;
        }

        if arrival.starts_with(region_prefix) {
            let Some(airport) = airports.get(&arrival) else {
                // The reference table is known-incomplete; skip silently.
                debug!("No coordinates for {arrival}, skipping arrival accounting");
                continue;
            };

            if groundspeed >= AIRBORNE_MIN_GROUNDSPEED_KT && altitude > AIRBORNE_MIN_ALTITUDE_FT {
                let distance = geo::distance_km(
                    pilot.latitude,
                    pilot.longitude,
                    airport.latitude,
                    airport.longitude,
                );
                let minutes = geo::minutes_to_arrival(distance, pilot.groundspeed);
                if minutes <= ARRIVAL_WINDOW_MIN {
                    entry_for(&mut stats, &mut slots, &arrival).arrivals += 1;
                }
            }
        }
    }

    stats.sort_by(|a, b| b.total().cmp(&a.total()));
    stats
}

fn entry_for<'a>(
    stats: &'a mut Vec<AirportStats>,
    slots: &mut HashMap<String, usize>,
    icao: &str,
) -> &'a mut AirportStats {
    let slot = *slots.entry(icao.to_string()).or_insert_with(|| {
        stats.push(AirportStats::new(icao.to_string()));
        stats.len() - 1
    });
    &mut stats[slot]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FlightPlan;

    const EGLL: (f64, f64) = (51.4706, -0.4619);
    const EGCC: (f64, f64) = (53.3494, -2.2795);

    fn index() -> AirportIndex {
        AirportIndex::from_records([
            AirportLocation {
                icao: "EGLL".to_string(),
                latitude: EGLL.0,
                longitude: EGLL.1,
            },
            AirportLocation {
                icao: "EGCC".to_string(),
                latitude: EGCC.0,
                longitude: EGCC.1,
            },
        ])
    }

    fn pilot(
        position: (f64, f64),
        groundspeed: Option<f64>,
        altitude: Option<f64>,
        departure: &str,
        arrival: &str,
    ) -> Pilot {
        Pilot {
            latitude: position.0,
            longitude: position.1,
            groundspeed,
            altitude,
            flight_plan: Some(FlightPlan {
                departure: departure.to_string(),
                arrival: arrival.to_string(),
            }),
        }
    }

    fn stats_for<'a>(stats: &'a [AirportStats], icao: &str) -> Option<&'a AirportStats> {
        stats.iter().find(|s| s.icao == icao)
    }

    #[test]
    fn test_departure_counted_on_ground() {
        let pilots = [pilot(EGLL, Some(5.0), Some(50.0), "EGLL", "LFPG")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert_eq!(stats_for(&stats, "EGLL").unwrap().departures, 1);
    }

    #[test]
    fn test_departure_not_counted_airborne() {
        let pilots = [pilot(EGLL, Some(25.0), Some(500.0), "EGLL", "LFPG")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert!(stats_for(&stats, "EGLL").is_none());
    }

    #[test]
    fn test_missing_kinematics_never_count_as_grounded() {
        // Absent groundspeed/altitude must not inflate departure counts
        let pilots = [pilot(EGLL, None, None, "EGLL", "LFPG")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert!(stats.is_empty());
    }

    #[test]
    fn test_departure_outside_region_ignored() {
        let pilots = [pilot((49.01, 2.55), Some(5.0), Some(50.0), "LFPG", "EGLL")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert!(stats_for(&stats, "LFPG").is_none());
    }

    #[test]
    fn test_arrival_counted_within_window() {
        // ~85 km out at 300 knots is under ten minutes to run
        let pilots = [pilot((51.0, 0.5), Some(300.0), Some(5000.0), "LFPG", "EGLL")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert_eq!(stats_for(&stats, "EGLL").unwrap().arrivals, 1);
    }

    #[test]
    fn test_arrival_not_counted_beyond_window() {
        // Same aircraft state but thousands of kilometers out
        let pilots = [pilot((30.0, 30.0), Some(300.0), Some(5000.0), "LFPG", "EGLL")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert!(stats_for(&stats, "EGLL").is_none());
    }

    #[test]
    fn test_arrival_without_coordinates_never_counts() {
        let pilots = [pilot((51.0, 0.5), Some(300.0), Some(5000.0), "LFPG", "EGXX")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert!(stats.is_empty());
    }

    #[test]
    fn test_arrival_without_groundspeed_never_counts() {
        // The sentinel makes the pilot airborne, but without a groundspeed
        // the time-to-arrival estimate is unreachable
        let pilots = [pilot((51.0, 0.5), None, Some(5000.0), "LFPG", "EGLL")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert!(stats.is_empty());
    }

    #[test]
    fn test_codes_uppercased_before_comparison() {
        let pilots = [pilot(EGLL, Some(5.0), Some(50.0), "egll", "lfpg")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert_eq!(stats_for(&stats, "EGLL").unwrap().departures, 1);
    }

    #[test]
    fn test_boundary_gap_counts_nothing() {
        // Exactly 100 ft at airborne speed: neither on ground nor airborne
        let pilots = [pilot(EGLL, Some(30.0), Some(100.0), "EGLL", "EGLL")];
        let stats = aggregate(&pilots, &index(), "EG");
        assert!(stats.is_empty());
    }

    #[test]
    fn test_sorted_by_total_descending_with_stable_ties() {
        let pilots = [
            pilot(EGCC, Some(5.0), Some(50.0), "EGCC", "LFPG"),
            pilot(EGLL, Some(5.0), Some(50.0), "EGLL", "LFPG"),
            pilot(EGLL, Some(5.0), Some(50.0), "EGLL", "LFPG"),
            pilot((51.0, 0.5), Some(300.0), Some(5000.0), "LFPG", "EGLL"),
            pilot((53.0, -2.0), Some(300.0), Some(5000.0), "LFPG", "EGCC"),
        ];
        let stats = aggregate(&pilots, &index(), "EG");

        // EGLL has three movements, EGCC two
        assert_eq!(stats[0].icao, "EGLL");
        assert_eq!(stats[0].departures, 2);
        assert_eq!(stats[0].arrivals, 1);
        assert_eq!(stats[1].icao, "EGCC");
        assert_eq!(stats[1].total(), 2);
    }

    #[test]
    fn test_tie_keeps_encounter_order() {
        let pilots = [
            pilot(EGCC, Some(5.0), Some(50.0), "EGCC", "LFPG"),
            pilot(EGLL, Some(5.0), Some(50.0), "EGLL", "LFPG"),
        ];
        let stats = aggregate(&pilots, &index(), "EG");
        assert_eq!(stats[0].icao, "EGCC");
        assert_eq!(stats[1].icao, "EGLL");
    }

    #[test]
    fn test_busy_flag_threshold() {
        let mut airport = AirportStats::new("EGLL".to_string());
        airport.departures = 25;
        assert!(!airport.is_busy());
        airport.departures = 26;
        assert!(airport.is_busy());
    }

    #[test]
    fn test_index_later_entry_overrides() {
        let index = AirportIndex::from_records([
            AirportLocation {
                icao: "EGLL".to_string(),
                latitude: 0.0,
                longitude: 0.0,
            },
            AirportLocation {
                icao: "EGLL".to_string(),
                latitude: EGLL.0,
                longitude: EGLL.1,
            },
        ]);
        assert_eq!(index.len(), 1);
        let location = index.get("EGLL").unwrap();
        assert!((location.latitude - EGLL.0).abs() < f64::EPSILON);
    }
}
