//! Fixed-cadence poller for the latest focus reading.
//!
//! Runs on its own interval, decoupled from both the sensor write rate and
//! the simulation frame rate. Transport failures are treated as "sensor
//! disconnected", never as fatal: the loop keeps its cadence, and the cadence
//! itself is the retry policy.

use crate::core::ingest::LatestReading;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a running poll loop.
pub struct PollerHandle {
    readings: watch::Receiver<LatestReading>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// A fresh receiver for the latest polled reading.
    pub fn readings(&self) -> watch::Receiver<LatestReading> {
        self.readings.clone()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Spawn the poll loop against `base_url` (e.g. `http://127.0.0.1:3001`).
///
/// Publishes [`LatestReading::disconnected`] until the first successful fetch
/// and after every failed one.
pub fn spawn(base_url: String, interval: Duration) -> PollerHandle {
    let (tx, rx) = watch::channel(LatestReading::disconnected());

    // Requests are local; a hung one should never span more than a few polls.
    let client = reqwest::Client::builder()
        .timeout(interval.max(Duration::from_millis(500)))
        .build()
        .expect("Failed to create HTTP client");

    let task = tokio::spawn(async move {
        let url = format!("{base_url}/api/focus-data");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let reading = match fetch(&client, &url).await {
                Ok(reading) => reading,
                Err(e) => {
                    tracing::debug!("poll failed, treating sensor as disconnected: {e}");
                    LatestReading::disconnected()
                }
            };

            if tx.send(reading).is_err() {
                // All consumers gone
                break;
            }
        }
    });

    PollerHandle { readings: rx, task }
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<LatestReading, reqwest::Error> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<LatestReading>()
        .await
}
