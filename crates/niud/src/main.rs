//! niud - NIU telemetry bridge daemon
//!
//! Polls the vendor cloud API for one scooter on a fixed interval and
//! republishes the normalized snapshot: each selected field as a
//! structured log event and, when configured, a redacted JSON snapshot
//! file for offline inspection.
//!
//! Usage:
//!   niud <config.toml>

use std::path::Path;
use std::time::Duration;

use niu_client::NiuClient;
use niu_core::{Field, NormalizedSnapshot};
use niu_poller::{Credentials, Poller, SnapshotPersister};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::Config;

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let mut result = Args { config_path: None };

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other if !other.starts_with('-') => {
                result.config_path = Some(other.to_string());
            }
            _ => {
                tracing::warn!("Unknown argument: {arg}");
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"niud - NIU telemetry bridge daemon

Usage: niud <config.toml>

The config file provides account credentials, the vehicle index, the poll
interval and an optional snapshot path:

  [account]
  username = "me@example.com"
  password = "..."
  vehicle_index = 0

  [poll]
  interval_secs = 60
  snapshot_path = "/var/lib/niud/last_response.json"

  [fields]
  selected = ["battery.temperature", "position.lat", "position.lng"]
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "niud=info,niu_poller=info,niu_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args();
    let Some(config_path) = args.config_path else {
        print_help();
        std::process::exit(2);
    };

    tracing::info!("Loading config from: {config_path}");
    let config = Config::load(Path::new(&config_path))?;
    let selected = config.selected_fields()?;

    let client = NiuClient::new()?;
    let credentials = Credentials {
        username: config.account.username.clone(),
        password: config.account.password.clone(),
    };

    // Setup is fatal on failure: no poller, no loop, no partial state.
    let mut poller = Poller::connect(client, &credentials, config.account.vehicle_index).await?;
    if let Some(path) = &config.poll.snapshot_path {
        poller = poller.with_persister(SnapshotPersister::new(path));
    }

    tracing::info!(
        sn = %poller.vehicle().serial_number,
        name = %poller.vehicle().display_name,
        interval_secs = config.poll.interval_secs,
        fields = selected.len(),
        "starting refresh loop"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(config.poll.interval_secs));
    // A tick arriving while a cycle is still running is dropped, not queued.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match poller.refresh().await {
                    Ok(snapshot) => publish(&snapshot, &selected),
                    Err(err) => tracing::warn!(%err, "refresh cycle produced no fresh data"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Emit each selected field as a structured event.
///
/// This is the downstream seam: a host platform consuming the daemon's
/// output hooks these named, typed data points however it likes.
fn publish(snapshot: &NormalizedSnapshot, selected: &[Field]) {
    for field in selected {
        tracing::info!(
            target: "niud::fields",
            field = %field.qualified_name(),
            value = %snapshot.get(*field),
            "data point"
        );
    }
}
