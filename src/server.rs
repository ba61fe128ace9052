//! HTTP server exposing the focus-telemetry API.
//!
//! Routes:
//! - `POST /api/focus-data`    sensor script writes one reading
//! - `GET  /api/focus-data`    frontend/poller reads the latest reading
//! - `POST /api/session/start` begin a focus session
//! - `POST /api/session/stop`  end it and collect aggregate stats
//! - `GET  /api/health`        liveness probe
//!
//! # Architecture
//!
//! ```text
//! EEG script ──→ POST /api/focus-data ──→ SignalStore ──→ GET /api/focus-data ──→ poller
//!                                             │
//!                                     [session history]
//! ```
//!
//! All mutation (readings, session start/stop) happens under one write lock,
//! so a session boundary can never interleave with an in-flight reading.

use crate::clock::Clock;
use crate::config::Config;
use crate::core::ingest::{FocusReading, LatestReading, SignalStore};
use crate::core::session::SessionController;
use crate::core::stats::SessionStats;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot, RwLock};
use tower_http::cors::{Any, CorsLayer};

/// Session lifecycle notifications for in-process consumers (the sim loop).
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent {
    Started { at: DateTime<Utc> },
    Stopped { at: DateTime<Utc> },
}

/// Reading store and session controller behind one writer lock.
#[derive(Debug, Default)]
struct Telemetry {
    store: SignalStore,
    session: SessionController,
}

/// Shared server state.
pub struct ServerState {
    telemetry: RwLock<Telemetry>,
    clock: Arc<dyn Clock>,
    freshness_window: chrono::Duration,
    session_events: broadcast::Sender<SessionEvent>,
}

impl ServerState {
    /// Create new server state.
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let (session_events, _) = broadcast::channel(16);
        Self {
            telemetry: RwLock::new(Telemetry::default()),
            clock,
            freshness_window: config.freshness_window(),
            session_events,
        }
    }

    /// Subscribe to session start/stop notifications.
    pub fn subscribe_sessions(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_events.subscribe()
    }
}

/// Handle to a running server.
pub struct ServerHandle {
    /// Bound address (useful with port 0)
    pub addr: SocketAddr,
    /// Shared state, for session-event subscriptions
    pub state: Arc<ServerState>,
    /// Send to shut the server down gracefully
    pub shutdown: oneshot::Sender<()>,
}

/// One reading posted by the sensor script.
#[derive(Debug, Deserialize)]
pub struct RecordReadingRequest {
    pub score: f64,
    /// Epoch milliseconds; stamped with server time when omitted
    pub timestamp: Option<i64>,
}

/// Plain acknowledgement.
#[derive(Serialize)]
pub struct AckResponse {
    pub success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartResponse {
    pub success: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub session_start_time: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStopResponse {
    pub success: bool,
    /// Session length in milliseconds
    pub duration: i64,
    pub focus_stats: SessionStats,
    pub focus_history: Vec<FocusReading>,
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/focus-data
///
/// Validates and stores one reading; 400 with the rejection message when the
/// score is not finite or outside `[-1, 1]`. Prior state is retained on
/// rejection.
async fn record_reading(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RecordReadingRequest>,
) -> Result<Json<AckResponse>, (StatusCode, Json<ErrorResponse>)> {
    let now = state.clock.now();
    // Client timestamps are trusted as-is; unparseable ones fall back to now.
    let timestamp = request.timestamp.and_then(DateTime::from_timestamp_millis);

    let mut telemetry = state.telemetry.write().await;
    match telemetry.store.record(request.score, timestamp, now) {
        Ok(reading) => {
            tracing::debug!("focus score: {:.3}", reading.score);
            Ok(Json(AckResponse { success: true }))
        }
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// GET /api/focus-data
async fn latest_reading(State(state): State<Arc<ServerState>>) -> Json<LatestReading> {
    let now = state.clock.now();
    let telemetry = state.telemetry.read().await;
    Json(telemetry.store.latest(now, state.freshness_window))
}

/// POST /api/session/start
///
/// Idempotent: starting while Active restarts the session in place.
async fn start_session(State(state): State<Arc<ServerState>>) -> Json<SessionStartResponse> {
    let now = state.clock.now();
    let started_at = {
        let mut telemetry = state.telemetry.write().await;
        let Telemetry { store, session } = &mut *telemetry;
        session.start(store, now)
    };

    let _ = state
        .session_events
        .send(SessionEvent::Started { at: started_at });

    Json(SessionStartResponse {
        success: true,
        session_start_time: started_at,
    })
}

/// POST /api/session/stop
///
/// Stopping while Idle returns a zero-duration outcome, not an error.
async fn stop_session(State(state): State<Arc<ServerState>>) -> Json<SessionStopResponse> {
    let now = state.clock.now();
    let outcome = {
        let mut telemetry = state.telemetry.write().await;
        let Telemetry { store, session } = &mut *telemetry;
        session.stop(store, now)
    };

    let _ = state.session_events.send(SessionEvent::Stopped { at: now });

    Json(SessionStopResponse {
        success: true,
        duration: outcome.duration_ms,
        focus_stats: outcome.stats,
        focus_history: outcome.readings,
    })
}

/// GET /favicon.ico - browsers ask, nothing to serve.
async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Run the HTTP server.
pub async fn run(config: Config, clock: Arc<dyn Clock>) -> anyhow::Result<ServerHandle> {
    let state = Arc::new(ServerState::new(&config, clock));

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/focus-data", get(latest_reading).post(record_reading))
        .route("/api/session/start", post(start_session))
        .route("/api/session/stop", post(stop_session))
        .route("/favicon.ico", get(favicon))
        .layer(
            // The frontend and the sensor script may run anywhere on the LAN
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("mindtree agent listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("server shutdown signal received");
            })
            .await
        {
            tracing::error!("server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: actual_addr,
        state,
        shutdown: shutdown_tx,
    })
}
