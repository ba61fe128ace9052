//! Focus-reading ingestion.
//!
//! The sensor script posts one scalar reading at a time. This module owns the
//! write boundary: validation, the "latest reading" cell the poller reads,
//! and the append-only history kept while a session is recording.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One validated focus sample.
///
/// Immutable once recorded; scores are guaranteed to be finite and within
/// `[-1.0, 1.0]` because the only producer is [`SignalStore::record`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusReading {
    /// Momentary focus score, -1.0 (distracted) to 1.0 (focused)
    pub score: f64,
    /// When the sample was taken (epoch milliseconds on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// The most recent reading plus a freshness flag.
///
/// `is_active` means "the sensor produced data recently". It is a freshness
/// signal, deliberately distinct from the session Idle/Active state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReading {
    pub score: f64,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl LatestReading {
    /// The reading published before any sample arrives, or when the sensor
    /// link is down.
    pub fn disconnected() -> Self {
        Self {
            score: 0.0,
            timestamp: None,
            is_active: false,
        }
    }
}

/// Rejection returned when a posted score fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReading {
    /// NaN or infinite
    NotFinite,
    /// Outside `[-1.0, 1.0]`
    OutOfRange,
}

impl std::fmt::Display for InvalidReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReading::NotFinite => write!(f, "Invalid score. Must be a finite number"),
            InvalidReading::OutOfRange => write!(f, "Invalid score. Must be between -1 and 1"),
        }
    }
}

impl std::error::Error for InvalidReading {}

/// Single-writer store for the latest reading and the in-session history.
///
/// All mutation happens under the server's write lock, so a session boundary
/// can never interleave with an in-flight `record`.
#[derive(Debug, Default)]
pub struct SignalStore {
    latest_score: f64,
    latest_timestamp: Option<DateTime<Utc>>,
    recording: bool,
    history: Vec<FocusReading>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store one reading.
    ///
    /// A rejected reading leaves all state unchanged. When no timestamp is
    /// supplied the sample is stamped with `now`. While a recording window is
    /// open the reading is also appended to the session history.
    pub fn record(
        &mut self,
        score: f64,
        timestamp: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<FocusReading, InvalidReading> {
        if !score.is_finite() {
            return Err(InvalidReading::NotFinite);
        }
        if !(-1.0..=1.0).contains(&score) {
            return Err(InvalidReading::OutOfRange);
        }

        let reading = FocusReading {
            score,
            timestamp: timestamp.unwrap_or(now),
        };
        self.latest_score = reading.score;
        self.latest_timestamp = Some(reading.timestamp);
        if self.recording {
            self.history.push(reading);
        }
        Ok(reading)
    }

    /// The latest reading with its freshness flag relative to `now`.
    pub fn latest(&self, now: DateTime<Utc>, freshness_window: Duration) -> LatestReading {
        let is_active = self
            .latest_timestamp
            .map(|ts| now - ts < freshness_window)
            .unwrap_or(false);
        LatestReading {
            score: self.latest_score,
            timestamp: self.latest_timestamp,
            is_active,
        }
    }

    /// Open a fresh recording window: latest reading zeroed, history cleared.
    pub fn start_recording(&mut self) {
        self.latest_score = 0.0;
        self.latest_timestamp = None;
        self.history.clear();
        self.recording = true;
    }

    /// Close the recording window and hand back the collected history.
    pub fn stop_recording(&mut self) -> Vec<FocusReading> {
        self.recording = false;
        std::mem::take(&mut self.history)
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRESHNESS: i64 = 5000;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn freshness() -> Duration {
        Duration::milliseconds(FRESHNESS)
    }

    #[test]
    fn test_record_in_range() {
        let mut store = SignalStore::new();
        for score in [-1.0, -0.5, 0.0, 0.5, 1.0] {
            store.record(score, None, t0()).unwrap();
            assert_eq!(store.latest(t0(), freshness()).score, score);
        }
    }

    #[test]
    fn test_record_rejects_out_of_range() {
        let mut store = SignalStore::new();
        store.record(0.3, Some(t0()), t0()).unwrap();

        for score in [1.5, -2.0, 1.0001] {
            assert_eq!(store.record(score, None, t0()), Err(InvalidReading::OutOfRange));
        }
        assert_eq!(
            store.record(f64::NAN, None, t0()),
            Err(InvalidReading::NotFinite)
        );
        assert_eq!(
            store.record(f64::INFINITY, None, t0()),
            Err(InvalidReading::NotFinite)
        );

        // Prior state retained after every rejection
        let latest = store.latest(t0(), freshness());
        assert_eq!(latest.score, 0.3);
        assert_eq!(latest.timestamp, Some(t0()));
    }

    #[test]
    fn test_empty_store_is_inactive() {
        let store = SignalStore::new();
        let latest = store.latest(t0(), freshness());
        assert_eq!(latest.score, 0.0);
        assert_eq!(latest.timestamp, None);
        assert!(!latest.is_active);
    }

    #[test]
    fn test_freshness_window() {
        let mut store = SignalStore::new();
        store.record(0.5, Some(t0()), t0()).unwrap();

        let fresh = store.latest(t0() + Duration::milliseconds(FRESHNESS - 1), freshness());
        assert!(fresh.is_active);

        let stale = store.latest(t0() + Duration::milliseconds(FRESHNESS), freshness());
        assert!(!stale.is_active);
    }

    #[test]
    fn test_history_only_while_recording() {
        let mut store = SignalStore::new();
        store.record(0.1, None, t0()).unwrap();
        assert_eq!(store.history_len(), 0);

        store.start_recording();
        assert_eq!(store.latest(t0(), freshness()).timestamp, None);

        store.record(0.2, None, t0()).unwrap();
        store.record(0.4, None, t0()).unwrap();
        assert_eq!(store.history_len(), 2);

        let history = store.stop_recording();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].score, 0.2);
        assert_eq!(store.history_len(), 0);

        store.record(0.6, None, t0()).unwrap();
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn test_latest_reading_wire_format() {
        let reading = LatestReading {
            score: 0.25,
            timestamp: Some(t0()),
            is_active: true,
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["score"], 0.25);
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
        assert_eq!(json["isActive"], true);

        let back: LatestReading = serde_json::from_value(json).unwrap();
        assert_eq!(back, reading);

        let empty: LatestReading =
            serde_json::from_str(r#"{"score":0,"timestamp":null,"isActive":false}"#).unwrap();
        assert_eq!(empty, LatestReading::disconnected());
    }
}
