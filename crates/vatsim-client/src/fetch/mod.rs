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

//! Periodic snapshot fetch task.
//!
//! The fetch loop runs in a background task, emits events over a bounded
//! channel, supports URL hot-reload through a `watch` channel, and shuts
//! down through a `CancellationToken`. The fixed interval doubles as the
//! retry policy: a failed cycle emits an event and changes nothing else.

use std::time::Duration;

use log::{error, info};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::snapshot::Snapshot;

/// Default VATSIM v3 data-feed endpoint.
pub const DEFAULT_SNAPSHOT_URL: &str = "https://data.vatsim.net/v3/vatsim-data.json";

/// Configuration for the snapshot fetch task.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Snapshot document URL.
    pub url: String,
    /// Delay between fetch cycles.
    pub refresh_interval: Duration,
    /// Channel buffer size for emitted events.
    pub buffer_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SNAPSHOT_URL.to_string(),
            refresh_interval: Duration::from_secs(60),
            buffer_size: 16,
        }
    }
}

/// Errors from one fetch cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("snapshot request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Events emitted by the fetch task.
#[derive(Debug)]
pub enum FetchEvent {
    /// A fetch cycle started.
    Fetching,
    /// A snapshot was fetched and decoded.
    SnapshotReceived(Snapshot),
    /// The cycle failed; held data must be left untouched.
    FetchFailed(String),
}

/// Handle to a spawned snapshot fetch task.
///
/// The task fetches immediately and then on the configured interval. Use
/// `set_url()` to change the endpoint at runtime (the next fetch happens
/// right away) and `shutdown()` to stop the loop.
pub struct SnapshotFeed {
    url_tx: watch::Sender<String>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for SnapshotFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotFeed")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl SnapshotFeed {
    /// Spawn the fetch loop, returning the control handle and the event
    /// receiver.
    ///
    /// Must be called from within a tokio runtime context.
    #[must_use]
    pub fn spawn(config: FetchConfig) -> (Self, mpsc::Receiver<FetchEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.buffer_size);
        let (url_tx, url_rx) = watch::channel(config.url.clone());
        let cancel_token = CancellationToken::new();

        let task_cancel = cancel_token.clone();
        let refresh_interval = config.refresh_interval;

        tokio::spawn(async move {
            fetch_loop(event_tx, url_rx, task_cancel, refresh_interval).await;
        });

        (
            Self {
                url_tx,
                cancel_token,
            },
            event_rx,
        )
    }

    /// Change the snapshot URL; the next fetch starts immediately.
    pub fn set_url(&self, url: String) {
        let _ = self.url_tx.send(url);
    }

    /// Get the current snapshot URL.
    #[must_use]
    pub fn current_url(&self) -> String {
        self.url_tx.borrow().clone()
    }

    /// Shut down the fetch task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for SnapshotFeed {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn fetch_loop(
    event_tx: mpsc::Sender<FetchEvent>,
    mut url_rx: watch::Receiver<String>,
    cancel_token: CancellationToken,
    refresh_interval: Duration,
) {
    let client = match reqwest::Client::builder().build() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    loop {
        if cancel_token.is_cancelled() {
            info!("Snapshot feed cancelled");
            return;
        }

        let url = url_rx.borrow_and_update().clone();

        if event_tx.send(FetchEvent::Fetching).await.is_err() {
            return; // Receiver dropped
        }

        match fetch_snapshot(&client, &url).await {
            Ok(snapshot) => {
                info!(
                    "Fetched snapshot: {} controllers, {} pilots",
                    snapshot.controllers.len(),
                    snapshot.pilots.len()
                );
                if event_tx
                    .send(FetchEvent::SnapshotReceived(snapshot))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Err(e) => {
                error!("Snapshot fetch failed: {}", e);
                if event_tx
                    .send(FetchEvent::FetchFailed(e.to_string()))
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }

        tokio::select! {
            () = sleep(refresh_interval) => {}
            _ = url_rx.changed() => {
                info!("Snapshot URL changed, refetching immediately");
            }
            () = cancel_token.cancelled() => {
                info!("Snapshot feed cancelled during refresh delay");
                return;
            }
        }
    }
}

async fn fetch_snapshot(client: &reqwest::Client, url: &str) -> Result<Snapshot, FetchError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json::<Snapshot>().await?)
}
