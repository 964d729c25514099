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

//! Client library for the VATSIM public data feed.
//!
//! This library provides a modular architecture for ingesting periodic
//! snapshots of flight-network participants and deriving regional views.
//! The layers can be used independently or composed together:
//!
//! - **Snapshot layer**: serde types for the v3 data document
//! - **Roster layer**: regional participant filtering and the held sets
//! - **Geo/Stats layers**: great-circle estimation and per-airport
//!   arrival/departure aggregation
//! - **Fetch layer**: periodic HTTP refresh with URL hot-reload and
//!   graceful cancellation
//!
//! # Quick Start
//!
//! Use the [`Feed`] type for full-stack operation:
//!
//! ```no_run
//! use vatsim_client::{Feed, FeedConfig};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let feed = Feed::spawn(FeedConfig::default());
//!
//!     // Polling approach
//!     loop {
//!         for controller in feed.controllers() {
//!             println!("{}: {:?}", controller.callsign, controller.frequency);
//!         }
//!         tokio::time::sleep(Duration::from_secs(5)).await;
//!     }
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! ## Stats Layer Only
//!
//! ```
//! use vatsim_client::{aggregate, AirportIndex, AirportLocation};
//!
//! let airports = AirportIndex::from_records([AirportLocation {
//!     icao: "EGLL".to_string(),
//!     latitude: 51.4706,
//!     longitude: -0.4619,
//! }]);
//!
//! let stats = aggregate(&[], &airports, "EG");
//! assert!(stats.is_empty());
//! ```

pub mod fetch;
pub mod geo;
pub mod roster;
pub mod snapshot;
pub mod stats;

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

pub use fetch::{FetchConfig, FetchError, FetchEvent, SnapshotFeed, DEFAULT_SNAPSHOT_URL};
pub use roster::{Facility, Roster, RosterConfig};
pub use snapshot::{Controller, FlightPlan, Pilot, Snapshot};
pub use stats::{aggregate, AirportIndex, AirportLocation, AirportStats};

/// Notices emitted by the full-stack feed after each fetch cycle.
#[derive(Debug, Clone)]
pub enum FeedNotice {
    /// A snapshot was applied to the roster.
    SnapshotApplied { controllers: usize, pilots: usize },
    /// A fetch cycle failed; the previously held roster is unchanged.
    FetchFailed(String),
}

/// Configuration for the full-stack feed.
#[derive(Debug, Clone, Default)]
pub struct FeedConfig {
    /// Fetch task configuration.
    pub fetch: FetchConfig,
    /// Roster filtering rules.
    pub roster: RosterConfig,
}

#[derive(Debug, Default)]
struct FeedShared {
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<String>,
    fetching: bool,
}

/// Full-stack snapshot feed that wires all layers together.
///
/// The feed manages the periodic fetch task and applies each received
/// snapshot to a held [`Roster`], replacing the participant sets
/// wholesale. A failed cycle leaves the roster untouched and is surfaced
/// through [`FeedNotice::FetchFailed`] and [`Feed::last_error`].
pub struct Feed {
    roster: Arc<RwLock<Roster>>,
    shared: Arc<RwLock<FeedShared>>,
    notice_tx: broadcast::Sender<FeedNotice>,
    fetcher: SnapshotFeed,
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl Feed {
    /// Spawn a new feed with the given configuration.
    ///
    /// This starts the fetch task and an event-processing task; both are
    /// cancelled when the feed is dropped. Must be called from within a
    /// tokio runtime context.
    #[must_use]
    pub fn spawn(config: FeedConfig) -> Self {
        let (fetcher, mut event_rx) = SnapshotFeed::spawn(config.fetch);
        let roster = Arc::new(RwLock::new(Roster::new(config.roster)));
        let shared = Arc::new(RwLock::new(FeedShared::default()));
        let (notice_tx, _) = broadcast::channel(32);

        let roster_task = Arc::clone(&roster);
        let shared_task = Arc::clone(&shared);
        let notice_task = notice_tx.clone();

        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match event {
                    FetchEvent::Fetching => {
                        if let Ok(mut shared) = shared_task.write() {
                            shared.fetching = true;
                        }
                    }
                    FetchEvent::SnapshotReceived(snapshot) => {
                        let mut counts = (0, 0);
                        if let Ok(mut roster) = roster_task.write() {
                            roster.apply_snapshot(snapshot);
                            counts = (roster.controllers().len(), roster.pilots().len());
                        }
                        if let Ok(mut shared) = shared_task.write() {
                            shared.last_updated = Some(Utc::now());
                            shared.last_error = None;
                            shared.fetching = false;
                        }
                        let _ = notice_task.send(FeedNotice::SnapshotApplied {
                            controllers: counts.0,
                            pilots: counts.1,
                        });
                    }
                    FetchEvent::FetchFailed(message) => {
                        if let Ok(mut shared) = shared_task.write() {
                            shared.last_error = Some(message.clone());
                            shared.fetching = false;
                        }
                        let _ = notice_task.send(FeedNotice::FetchFailed(message));
                    }
                }
            }
        });

        Self {
            roster,
            shared,
            notice_tx,
            fetcher,
        }
    }

    /// Get the held regional controllers.
    #[must_use]
    pub fn controllers(&self) -> Vec<Controller> {
        self.roster
            .read()
            .map(|roster| roster.controllers().to_vec())
            .unwrap_or_default()
    }

    /// Get the held pilots with usable flight plans.
    #[must_use]
    pub fn pilots(&self) -> Vec<Pilot> {
        self.roster
            .read()
            .map(|roster| roster.pilots().to_vec())
            .unwrap_or_default()
    }

    /// When the last snapshot was applied.
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.shared.read().ok().and_then(|shared| shared.last_updated)
    }

    /// The most recent fetch error, cleared on the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.shared
            .read()
            .ok()
            .and_then(|shared| shared.last_error.clone())
    }

    /// Whether a fetch cycle is currently in flight.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.shared.read().map(|shared| shared.fetching).unwrap_or(false)
    }

    /// Subscribe to feed notices.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FeedNotice> {
        self.notice_tx.subscribe()
    }

    /// Change the snapshot URL; the next fetch starts immediately.
    pub fn set_url(&self, url: String) {
        self.fetcher.set_url(url);
    }

    /// Get the current snapshot URL.
    #[must_use]
    pub fn current_url(&self) -> String {
        self.fetcher.current_url()
    }

    /// Shut down the feed.
    pub fn shutdown(&self) {
        self.fetcher.shutdown();
    }
}
