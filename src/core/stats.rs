//! Post-session aggregation.
//!
//! Pure summary statistics over a session's reading history. Range validation
//! already happened at the ingestion boundary, so no NaN/Infinity handling is
//! needed here beyond the empty-input guard.

use crate::core::ingest::FocusReading;
use serde::{Deserialize, Serialize};

/// Summary statistics for one session.
///
/// Every numeric field is 0 for an empty session - never NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub average_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    /// Fraction of samples with score > 0
    pub positive_fraction: f64,
    pub total_samples: usize,
}

/// Aggregate a session's reading history.
pub fn aggregate(readings: &[FocusReading]) -> SessionStats {
    if readings.is_empty() {
        return SessionStats::default();
    }

    let total = readings.len();
    let mut sum = 0.0;
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;
    let mut positive = 0usize;

    for reading in readings {
        sum += reading.score;
        if reading.score > max {
            max = reading.score;
        }
        if reading.score < min {
            min = reading.score;
        }
        if reading.score > 0.0 {
            positive += 1;
        }
    }

    SessionStats {
        average_score: sum / total as f64,
        max_score: max,
        min_score: min,
        positive_fraction: positive as f64 / total as f64,
        total_samples: total,
    }
}
