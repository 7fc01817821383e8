//! Input loop: reads newline-delimited envelopes, keeps one client store per
//! IP and dispatches each event through the manager.

use std::io::Write;
use std::sync::Arc;

use dashmap::DashMap;
use relay_core::client::{Client, MemoryClientStore};
use relay_core::types::{ClientContext, ClientEvent, HostEventKind};
use relay_segment::transport::{Fetcher, HttpFetcher, RecordingFetcher};
use relay_segment::Manager;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub kind: HostEventKind,
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub client: ClientContext,
}

pub enum Delivery {
    Live(Arc<HttpFetcher>),
    DryRun(Arc<RecordingFetcher>),
}

impl Delivery {
    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        match self {
            Delivery::Live(f) => f.clone() as Arc<dyn Fetcher>,
            Delivery::DryRun(f) => f.clone() as Arc<dyn Fetcher>,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub lines: u64,
    pub dispatched: u64,
    pub skipped: u64,
}

pub struct Relay {
    manager: Manager,
    delivery: Delivery,
    stores: DashMap<String, Arc<MemoryClientStore>>,
    stats: RunStats,
}

impl Relay {
    /// The manager is built over the delivery's fetcher; register components
    /// on [`Relay::manager`] before running.
    pub fn new(delivery: Delivery) -> Self {
        Self {
            manager: Manager::new(delivery.fetcher()),
            delivery,
            stores: DashMap::new(),
            stats: RunStats::default(),
        }
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Process every line of `reader`. Lines that are not UTF-8 or not a
    /// valid envelope are logged and skipped. Only read and write failures
    /// end the run early. Dry-run requests are written to `out`, one JSON
    /// object per line.
    pub async fn run<R, W>(&mut self, mut reader: R, out: &mut W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            self.stats.lines += 1;

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = self.stats.lines, error = %e, "Skipping non UTF-8 line");
                    self.stats.skipped += 1;
                    continue;
                }
            };
            self.handle_line(line, out)?;
        }
        Ok(())
    }

    fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> anyhow::Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let envelope: EventEnvelope = match serde_json::from_str(line) {
            Ok(env) => env,
            Err(e) => {
                warn!(line = self.stats.lines, error = %e, "Skipping malformed event");
                self.stats.skipped += 1;
                return Ok(());
            }
        };

        let store = self
            .stores
            .entry(envelope.client.ip.clone())
            .or_insert_with(|| Arc::new(MemoryClientStore::new()))
            .clone();
        let event = ClientEvent::new(envelope.payload, Client::new(envelope.client, store));

        if self.manager.dispatch(envelope.kind, &event) > 0 {
            self.stats.dispatched += 1;
        }

        if let Delivery::DryRun(recorder) = &self.delivery {
            for request in recorder.take() {
                writeln!(out, "{}", serde_json::to_string(&request)?)?;
            }
        }
        Ok(())
    }

    /// Wait for in-flight sends and log the run summary.
    pub async fn finish(&self) {
        let RunStats {
            dispatched,
            skipped,
            ..
        } = self.stats;
        match &self.delivery {
            Delivery::Live(http) => {
                let delivered = http.drain().await;
                info!(
                    dispatched,
                    skipped,
                    sent = delivered.sent,
                    failed = delivered.failed,
                    "Segment relay finished"
                );
            }
            Delivery::DryRun(_) => {
                info!(dispatched, skipped, "Segment relay dry run finished");
            }
        }
    }
}
