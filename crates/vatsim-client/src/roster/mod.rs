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

//! Participant filtering and the held regional roster.
//!
//! The roster keeps the latest filtered controller and pilot sets from a
//! snapshot. Each snapshot replaces both sets wholesale; nothing is
//! merged or accumulated across cycles.

use chrono::{DateTime, Utc};
use log::debug;

use crate::snapshot::{Controller, Pilot, Snapshot};

/// Filtering rules for regional participants.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    /// A controller is kept only if its callsign starts with one of these.
    pub allowed_prefixes: Vec<String>,

    /// Callsigns with this prefix are dropped even when an allowed prefix
    /// also matches (the top-level FIR station).
    pub excluded_prefix: String,

    /// Callsigns containing this token are dropped (observer sessions).
    pub excluded_token: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: ["EG", "LON", "MAN", "LTC", "STC", "THAMES", "ESSEX", "SCO"]
                .iter()
                .map(|prefix| (*prefix).to_string())
                .collect(),
            excluded_prefix: "EGTT".to_string(),
            excluded_token: "OBS".to_string(),
        }
    }
}

impl RosterConfig {
    /// Whether a controller callsign passes the regional filter.
    #[must_use]
    pub fn retains(&self, callsign: &str) -> bool {
        self.allowed_prefixes
            .iter()
            .any(|prefix| callsign.starts_with(prefix.as_str()))
            && !callsign.starts_with(&self.excluded_prefix)
            && !callsign.contains(&self.excluded_token)
    }
}

/// Display category derived from a controller callsign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Ground,
    Tower,
    Approach,
    Centre,
    Unknown,
}

impl Facility {
    /// Derive the category by token, in strict priority order. Some
    /// callsigns contain several tokens and the first match wins.
    #[must_use]
    pub fn from_callsign(callsign: &str) -> Self {
        if callsign.contains("GND") || callsign.contains("DEL") {
            Self::Ground
        } else if callsign.contains("TWR") {
            Self::Tower
        } else if callsign.contains("APP") || callsign.contains("DEP") {
            Self::Approach
        } else if callsign.contains("CTR") {
            Self::Centre
        } else {
            Self::Unknown
        }
    }
}

/// Latest filtered participant sets.
#[derive(Debug)]
pub struct Roster {
    config: RosterConfig,
    controllers: Vec<Controller>,
    pilots: Vec<Pilot>,
    last_updated: Option<DateTime<Utc>>,
}

impl Roster {
    /// Create an empty roster with the given filtering rules.
    #[must_use]
    pub fn new(config: RosterConfig) -> Self {
        Self {
            config,
            controllers: Vec::new(),
            pilots: Vec::new(),
            last_updated: None,
        }
    }

    /// Replace both held sets from a fresh snapshot.
    ///
    /// Controllers are filtered by the regional rules with input order
    /// preserved; pilots without a usable flight plan are dropped
    /// silently, since they carry no information the aggregation can use.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let total_controllers = snapshot.controllers.len();
        let total_pilots = snapshot.pilots.len();

        self.controllers = snapshot
            .controllers
            .into_iter()
            .filter(|controller| self.config.retains(&controller.callsign))
            .collect();
        self.pilots = snapshot
            .pilots
            .into_iter()
            .filter(Pilot::has_route)
            .collect();
        self.last_updated = Some(Utc::now());

        debug!(
            "Snapshot applied: {}/{} controllers retained, {}/{} pilots with routes",
            self.controllers.len(),
            total_controllers,
            self.pilots.len(),
            total_pilots
        );
    }

    /// The held regional controllers, in snapshot order.
    #[must_use]
    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    /// The held pilots with usable flight plans, in snapshot order.
    #[must_use]
    pub fn pilots(&self) -> &[Pilot] {
        &self.pilots
    }

    /// When the last snapshot was applied.
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}
