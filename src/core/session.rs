//! Session lifecycle.
//!
//! A strict Idle <-> Active state machine. `start` while already Active is a
//! fresh restart, `stop` while Idle is a no-op outcome - neither is an error.

use crate::core::ingest::{FocusReading, SignalStore};
use crate::core::stats::{aggregate, SessionStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Session lifecycle state. Unrelated to the sensor freshness flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
}

/// Everything handed back when a session ends.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    /// Elapsed session time in milliseconds (0 when stopped while Idle)
    pub duration_ms: i64,
    pub stats: SessionStats,
    pub readings: Vec<FocusReading>,
}

impl SessionOutcome {
    fn empty() -> Self {
        Self {
            duration_ms: 0,
            stats: SessionStats::default(),
            readings: Vec::new(),
        }
    }
}

/// Owns the Idle/Active lifecycle and drives the store's recording window.
#[derive(Debug, Default)]
pub struct SessionController {
    phase: SessionPhase,
    started_at: Option<DateTime<Utc>>,
    session_id: Option<Uuid>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Transition to Active, resetting the store's latest reading and history.
    ///
    /// Calling this while already Active restarts the session in place,
    /// discarding the in-progress history.
    pub fn start(&mut self, store: &mut SignalStore, now: DateTime<Utc>) -> DateTime<Utc> {
        if self.phase == SessionPhase::Active {
            tracing::info!("session restarted while active, discarding in-progress readings");
        }
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, "session started");

        store.start_recording();
        self.phase = SessionPhase::Active;
        self.started_at = Some(now);
        self.session_id = Some(id);
        now
    }

    /// Transition to Idle, aggregating and returning the ended session.
    pub fn stop(&mut self, store: &mut SignalStore, now: DateTime<Utc>) -> SessionOutcome {
        if self.phase == SessionPhase::Idle {
            return SessionOutcome::empty();
        }

        let readings = store.stop_recording();
        let stats = aggregate(&readings);
        let duration_ms = self
            .started_at
            .map(|started| (now - started).num_milliseconds().max(0))
            .unwrap_or(0);

        if let Some(id) = self.session_id.take() {
            tracing::info!(
                session_id = %id,
                duration_ms,
                samples = stats.total_samples,
                "session stopped"
            );
        }
        self.phase = SessionPhase::Idle;
        self.started_at = None;

        SessionOutcome {
            duration_ms,
            stats,
            readings,
        }
    }
}
