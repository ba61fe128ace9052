//! Mindtree Agent - focus-telemetry backend for the Growing Mind Tree app.
//!
//! An external sensor script (EEG) posts one scalar focus score at a time;
//! this agent validates and stores readings, tracks focus sessions,
//! aggregates post-session statistics, and runs the growth simulation whose
//! output the tree renderer consumes.
//!
//! # Architecture
//!
//! ```text
//! sensor script ──POST /api/focus-data──▶ ┌───────────────┐
//!                                         │  SignalStore  │
//! frontend ◀───GET /api/focus-data─────── │  + sessions   │
//!                                         └───────┬───────┘
//!                                                 │ poll (200ms)
//!                                         ┌───────▼───────┐
//!                                         │   sim loop    │──▶ GrowthSnapshot
//!                                         │ growth + hyst │──▶ LowFocusAlert
//!                                         └───────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mindtree_agent::{SignalStore, aggregate};
//! use chrono::Utc;
//!
//! let mut store = SignalStore::new();
//! store.start_recording();
//! store.record(0.5, None, Utc::now()).expect("valid score");
//! let stats = aggregate(&store.stop_recording());
//! assert_eq!(stats.total_samples, 1);
//! ```

pub mod clock;
pub mod config;
pub mod core;
pub mod poller;
pub mod server;
pub mod sim;

// Re-export key types at crate root for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use core::{
    aggregate, FocusReading, GrowthEngine, GrowthSnapshot, GrowthTuning, InvalidReading,
    LatestReading, LowFocusAlert, LowFocusDetector, LowFocusTuning, SessionController,
    SessionOutcome, SessionPhase, SessionStats, SignalStore,
};
pub use server::{ServerHandle, ServerState, SessionEvent};
pub use sim::{Simulation, SimulationHandle};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
