//! Mindtree Agent CLI
//!
//! Focus-telemetry backend for the Growing Mind Tree app.

use clap::{Parser, Subcommand};
use mindtree_agent::{
    clock::{Clock, SystemClock},
    config::Config,
    poller, server, sim, VERSION,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mindtree")]
#[command(version = VERSION)]
#[command(about = "Focus-telemetry backend for the Growing Mind Tree app", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the telemetry server, reading poller, and growth simulation
    Serve {
        /// Port to bind (0 for random)
        #[arg(long)]
        port: Option<u16>,

        /// Reading poll cadence in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Simulation frame cadence in milliseconds
        #[arg(long)]
        frame_interval_ms: Option<u64>,
    },

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            poll_interval_ms,
            frame_interval_ms,
        } => cmd_serve(port, poll_interval_ms, frame_interval_ms).await,
        Commands::Config => {
            cmd_config();
            Ok(())
        }
    }
}

async fn cmd_serve(
    port: Option<u16>,
    poll_interval_ms: Option<u64>,
    frame_interval_ms: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = Config::load().unwrap_or_default();
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(ms) = poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(ms) = frame_interval_ms {
        config.frame_interval_ms = ms;
    }

    tracing::info!("mindtree agent v{VERSION}");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let handle = server::run(config.clone(), clock.clone()).await?;

    let poller = poller::spawn(
        format!("http://127.0.0.1:{}", handle.addr.port()),
        Duration::from_millis(config.poll_interval_ms),
    );

    let mut sim_handle = sim::spawn(
        config.growth,
        config.low_focus,
        Duration::from_millis(config.frame_interval_ms),
        clock,
        poller.readings(),
        handle.state.subscribe_sessions(),
    );

    // The intervention screen is the frontend's job; here we only log.
    // Moving the handle in also keeps the snapshot channel alive.
    let alert_task = tokio::spawn(async move {
        while let Some(alert) = sim_handle.alerts.recv().await {
            tracing::warn!(since = %alert.since, "sustained low focus detected");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    let _ = handle.shutdown.send(());
    poller.abort();
    alert_task.abort();

    Ok(())
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
