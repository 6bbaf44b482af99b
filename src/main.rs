use haunt_paper::{Command, EngineConfig, EngineEvent, SimulationStore};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reads one JSON command per line on stdin and writes one JSON response per
/// line on stdout.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "haunt_paper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EngineConfig::from_env();
    info!(
        "Starting paper engine (default balance {:.2}, win rate {:?})",
        config.default_initial_balance, config.win_rate_method
    );
    let store = Arc::new(SimulationStore::new(config));

    let mut events = store.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Event log lagged, skipped {}", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Command>(line) {
            Ok(command) => match store.dispatch(command) {
                Ok(output) => serde_json::to_value(&output)?,
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            Err(e) => serde_json::json!({ "error": format!("Invalid command: {}", e) }),
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    info!("Input closed, shutting down with {} simulations", store.len());
    Ok(())
}

fn log_event(event: &EngineEvent) {
    match serde_json::to_string(event) {
        Ok(json) => debug!("Event: {}", json),
        Err(e) => warn!("Failed to serialize event for {}: {}", event.simulation_id(), e),
    }
}
