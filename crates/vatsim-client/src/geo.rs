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

//! Great-circle geometry and time-to-arrival estimation.

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers covered per minute at one knot (1.852 km/h).
const KNOT_KM_PER_MIN: f64 = 1.852 / 60.0;

/// Calculate the great-circle distance between two lat/lon points in
/// kilometers using the haversine formula.
///
/// Inputs are degrees. Symmetric in its arguments, zero for coincident
/// points, and finite for antipodal points.
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Estimate minutes until arrival for `distance_km` at `groundspeed` knots.
///
/// Returns `f64::INFINITY` when the groundspeed is missing, zero, or
/// negative: the estimate is "unreachable", not an error. Distance is not
/// clamped.
#[must_use]
pub fn minutes_to_arrival(distance_km: f64, groundspeed: Option<f64>) -> f64 {
    match groundspeed {
        Some(speed) if speed > 0.0 => distance_km / (speed * KNOT_KM_PER_MIN),
        _ => f64::INFINITY,
    }
}
