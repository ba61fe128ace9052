//! Core telemetry pipeline for the mindtree agent.
//!
//! This module contains:
//! - Reading ingestion and validation
//! - Session lifecycle and post-session aggregation
//! - The growth engine driving the tree visuals
//! - Sustained-low-focus detection

pub mod growth;
pub mod ingest;
pub mod lowfocus;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use growth::{GrowthEngine, GrowthSnapshot, GrowthTuning};
pub use ingest::{FocusReading, InvalidReading, LatestReading, SignalStore};
pub use lowfocus::{LowFocusAlert, LowFocusDetector, LowFocusTuning};
pub use session::{SessionController, SessionOutcome, SessionPhase};
pub use stats::{aggregate, SessionStats};
