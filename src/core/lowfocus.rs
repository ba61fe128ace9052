//! Sustained-low-focus detection with hysteresis.
//!
//! The condition must persist continuously for the dwell time before the
//! alert fires, and it fires at most once per continuous low-focus interval.
//! Recovery above the threshold re-arms detection.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Scores below this count as "low focus".
pub const LOW_FOCUS_THRESHOLD: f64 = 0.1;

/// How long focus must stay low before the alert fires.
pub const LOW_FOCUS_DWELL_MS: i64 = 30_000;

/// Tunable detector parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LowFocusTuning {
    pub threshold: f64,
    pub dwell_ms: i64,
}

impl Default for LowFocusTuning {
    fn default() -> Self {
        Self {
            threshold: LOW_FOCUS_THRESHOLD,
            dwell_ms: LOW_FOCUS_DWELL_MS,
        }
    }
}

/// One-shot alert emitted when low focus persisted for the dwell time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LowFocusAlert {
    /// When the continuous low-focus interval began
    pub since: DateTime<Utc>,
    /// When the dwell time elapsed
    pub detected_at: DateTime<Utc>,
}

/// Debounced detector over the `(score, now)` stream.
///
/// Pure state machine: time comes in as a parameter, so tests can cover a
/// 30-second dwell without sleeping.
#[derive(Debug)]
pub struct LowFocusDetector {
    threshold: f64,
    dwell: Duration,
    tracking_since: Option<DateTime<Utc>>,
    triggered: bool,
}

impl LowFocusDetector {
    pub fn new(tuning: LowFocusTuning) -> Self {
        Self {
            threshold: tuning.threshold,
            dwell: Duration::milliseconds(tuning.dwell_ms),
            tracking_since: None,
            triggered: false,
        }
    }

    /// Feed one tick of the reading stream.
    ///
    /// Returns the alert exactly once per continuous low-focus interval.
    pub fn tick(&mut self, score: f64, now: DateTime<Utc>) -> Option<LowFocusAlert> {
        if score < self.threshold {
            match self.tracking_since {
                None => {
                    self.tracking_since = Some(now);
                    None
                }
                Some(since) => {
                    if !self.triggered && now - since >= self.dwell {
                        self.triggered = true;
                        Some(LowFocusAlert {
                            since,
                            detected_at: now,
                        })
                    } else {
                        None
                    }
                }
            }
        } else {
            self.tracking_since = None;
            self.triggered = false;
            None
        }
    }

    /// Re-arm at session start.
    pub fn reset(&mut self) {
        self.tracking_since = None;
        self.triggered = false;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking_since.is_some()
    }
}
