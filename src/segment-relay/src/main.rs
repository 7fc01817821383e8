//! Segment Relay: forwards newline-delimited client events to the Segment
//! HTTP Tracking API.
//!
//! Each input line is an envelope `{"type": "track", "payload": {...},
//! "client": {...}}`. Clients are keyed by IP so anonymous ids persist
//! across their events for the lifetime of the process.

mod relay;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relay_core::config::AppConfig;
use relay_segment::transport::{HttpFetcher, RecordingFetcher};
use relay_segment::{EventAdaptor, SegmentComponent};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};

use crate::relay::{Delivery, Relay};

#[derive(Parser, Debug)]
#[command(name = "segment-relay")]
#[command(about = "Relay client analytics events to the Segment HTTP Tracking API")]
#[command(version)]
struct Cli {
    /// Read events from this file instead of stdin
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Segment write key (overrides config)
    #[arg(long, env = "SEGMENT_RELAY__SEGMENT__WRITE_KEY")]
    write_key: Option<String>,

    /// Destination hostname (overrides config)
    #[arg(long, env = "SEGMENT_RELAY__SEGMENT__HOSTNAME")]
    hostname: Option<String>,

    /// Print outbound requests as JSON instead of sending them
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so dry-run output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segment_relay=info,relay_segment=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(write_key) = cli.write_key {
        config.segment.write_key = write_key;
    }
    if let Some(hostname) = cli.hostname {
        config.segment.hostname = hostname;
    }

    info!(
        node_id = %config.node_id,
        hostname = %config.segment.hostname,
        dry_run = cli.dry_run,
        "Segment relay starting"
    );

    let delivery = if cli.dry_run {
        Delivery::DryRun(Arc::new(RecordingFetcher::new()))
    } else {
        Delivery::Live(Arc::new(HttpFetcher::new(&config.http)?))
    };

    let mut relay = Relay::new(delivery);
    let component = Arc::new(SegmentComponent::new(config.segment.clone()));
    if let Err(e) = component.adaptor().validate_config() {
        warn!(error = %e, "Segment settings look invalid; requests will be rejected upstream");
    }
    component.register(relay.manager());

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let outcome = relay.run(reader, &mut std::io::stdout()).await;
    if let Err(e) = &outcome {
        warn!(error = %e, "Input stopped early");
    }
    relay.finish().await;

    outcome
}
