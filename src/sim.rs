//! Simulation loop: ticks the growth engine and the low-focus detector at
//! render cadence off the most recent polled reading.
//!
//! Ticks are synchronous and re-apply the last known reading every frame
//! until the poller replaces it. Session start resets both components; while
//! Idle nothing ticks, so the growth state is left frozen after a stop.

use crate::clock::Clock;
use crate::core::growth::{GrowthEngine, GrowthSnapshot, GrowthTuning};
use crate::core::ingest::LatestReading;
use crate::core::lowfocus::{LowFocusAlert, LowFocusDetector, LowFocusTuning};
use crate::server::SessionEvent;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

/// Handle to the running simulation.
pub struct SimulationHandle {
    /// Latest growth snapshot for the renderer
    pub snapshots: watch::Receiver<GrowthSnapshot>,
    /// Sustained-low-focus alerts for the session orchestrator
    pub alerts: mpsc::Receiver<LowFocusAlert>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Per-frame simulation state, separate from the async loop so the tick
/// semantics are testable without a runtime.
pub struct Simulation {
    growth: GrowthEngine,
    detector: LowFocusDetector,
    active: bool,
}

impl Simulation {
    pub fn new(growth: GrowthTuning, low_focus: LowFocusTuning) -> Self {
        Self {
            growth: GrowthEngine::new(growth),
            detector: LowFocusDetector::new(low_focus),
            active: false,
        }
    }

    /// Apply a session lifecycle event.
    pub fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Started { .. } => {
                self.growth.reset();
                self.detector.reset();
                self.active = true;
            }
            SessionEvent::Stopped { .. } => {
                // Growth state stays frozen until the next start
                self.active = false;
            }
        }
    }

    /// One frame: the snapshot to publish, plus an alert if the low-focus
    /// dwell elapsed this frame. Returns `None` while no session is active.
    pub fn frame(
        &mut self,
        latest: &LatestReading,
        now: DateTime<Utc>,
    ) -> Option<(GrowthSnapshot, Option<LowFocusAlert>)> {
        if !self.active {
            return None;
        }

        // A stale reading means the sensor is gone: no positive signal
        let score = if latest.is_active { latest.score } else { 0.0 };

        let snapshot = self.growth.tick(score);
        if self.growth.maybe_shed_leaf(score) {
            tracing::trace!("leaf shed");
        }
        let alert = self.detector.tick(score, now);

        Some((snapshot, alert))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Spawn the frame loop.
///
/// Reads the latest polled reading each frame, ticks the simulation, and
/// publishes snapshots; session events reset or freeze it.
pub fn spawn(
    growth: GrowthTuning,
    low_focus: LowFocusTuning,
    frame_interval: Duration,
    clock: Arc<dyn Clock>,
    readings: watch::Receiver<LatestReading>,
    mut sessions: broadcast::Receiver<SessionEvent>,
) -> SimulationHandle {
    let (snapshot_tx, snapshot_rx) = watch::channel(GrowthSnapshot::default());
    let (alert_tx, alert_rx) = mpsc::channel(8);

    let task = tokio::spawn(async move {
        let mut sim = Simulation::new(growth, low_focus);
        let mut ticker = tokio::time::interval(frame_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = sessions.recv() => match event {
                    Ok(event) => sim.on_session_event(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("simulation missed {n} session events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = ticker.tick() => {
                    let latest = *readings.borrow();
                    let now = clock.now();
                    if let Some((snapshot, alert)) = sim.frame(&latest, now) {
                        if snapshot_tx.send(snapshot).is_err() {
                            break;
                        }
                        if let Some(alert) = alert {
                            if alert_tx.try_send(alert).is_err() {
                                tracing::warn!("low-focus alert dropped, consumer not keeping up");
                            }
                        }
                    }
                }
            }
        }
    });

    SimulationHandle {
        snapshots: snapshot_rx,
        alerts: alert_rx,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn fresh(score: f64) -> LatestReading {
        LatestReading {
            score,
            timestamp: Some(t0()),
            is_active: true,
        }
    }

    fn started() -> SessionEvent {
        SessionEvent::Started { at: t0() }
    }

    fn stopped() -> SessionEvent {
        SessionEvent::Stopped { at: t0() }
    }

    #[test]
    fn test_idle_simulation_does_not_tick() {
        let mut sim = Simulation::new(GrowthTuning::default(), LowFocusTuning::default());
        assert!(sim.frame(&fresh(1.0), t0()).is_none());
    }

    #[test]
    fn test_same_reading_reapplied_every_frame() {
        let mut sim = Simulation::new(GrowthTuning::default(), LowFocusTuning::default());
        sim.on_session_event(started());

        // Continuous re-application: an unchanged reading keeps growing the tree
        let reading = fresh(0.5);
        let (first, _) = sim.frame(&reading, t0()).unwrap();
        let (second, _) = sim.frame(&reading, t0()).unwrap();
        assert!(second.maturity > first.maturity);
    }

    #[test]
    fn test_stale_reading_does_not_grow() {
        let mut sim = Simulation::new(GrowthTuning::default(), LowFocusTuning::default());
        sim.on_session_event(started());

        let stale = LatestReading {
            score: 1.0,
            timestamp: Some(t0()),
            is_active: false,
        };
        let (snapshot, _) = sim.frame(&stale, t0()).unwrap();
        assert_eq!(snapshot.maturity, 0.0);
    }

    #[test]
    fn test_session_start_resets_growth() {
        let mut sim = Simulation::new(GrowthTuning::default(), LowFocusTuning::default());
        sim.on_session_event(started());

        for _ in 0..100 {
            sim.frame(&fresh(1.0), t0());
        }
        sim.on_session_event(started());

        let (snapshot, _) = sim.frame(&fresh(0.0), t0()).unwrap();
        assert_eq!(snapshot.maturity, 0.0);
    }

    #[test]
    fn test_stop_freezes_state() {
        let mut sim = Simulation::new(GrowthTuning::default(), LowFocusTuning::default());
        sim.on_session_event(started());
        for _ in 0..100 {
            sim.frame(&fresh(1.0), t0());
        }
        sim.on_session_event(stopped());
        assert!(!sim.is_active());
        assert!(sim.frame(&fresh(1.0), t0()).is_none());
    }

    #[test]
    fn test_low_focus_alert_through_frames() {
        let mut sim = Simulation::new(GrowthTuning::default(), LowFocusTuning::default());
        sim.on_session_event(started());

        // One frame per second of low focus for 40 simulated seconds
        let mut alerts = 0;
        for s in 0..40 {
            let now = t0() + ChronoDuration::seconds(s);
            let (_, alert) = sim.frame(&fresh(0.05), now).unwrap();
            if alert.is_some() {
                alerts += 1;
            }
        }
        assert_eq!(alerts, 1);
    }

    #[test]
    fn test_disconnected_sensor_counts_as_low_focus() {
        let mut sim = Simulation::new(GrowthTuning::default(), LowFocusTuning::default());
        sim.on_session_event(started());

        let mut alerts = 0;
        for s in 0..40 {
            let now = t0() + ChronoDuration::seconds(s);
            let (_, alert) = sim.frame(&LatestReading::disconnected(), now).unwrap();
            if alert.is_some() {
                alerts += 1;
            }
        }
        assert_eq!(alerts, 1);
    }
}
