//! Outbound transport: request building plus the fetch primitives the host
//! hands requests to. Sends are fire-and-forget; nothing is retried.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use relay_core::config::{HttpConfig, SegmentSettings};
use relay_core::error::{RelayError, RelayResult};
use relay_core::types::CallType;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::payload::SegmentPayload;

/// A fully built HTTP request ready for the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// `https://<hostname>/v1/<call>`
pub fn endpoint(settings: &SegmentSettings, call: CallType) -> String {
    format!("https://{}/v1/{}", settings.hostname, call.path_segment())
}

/// Basic auth header value carrying the write key.
pub fn basic_auth(write_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(write_key))
}

pub fn build_request(
    settings: &SegmentSettings,
    call: CallType,
    payload: &SegmentPayload,
) -> RelayResult<OutboundRequest> {
    Ok(OutboundRequest {
        url: endpoint(settings, call),
        method: "POST".to_string(),
        headers: vec![
            ("Authorization".to_string(), basic_auth(&settings.write_key)),
            ("Content-Type".to_string(), "application/json".to_string()),
        ],
        body: serde_json::to_string(payload)?,
    })
}

/// The host's fetch primitive. Implementations must not block the caller
/// on network completion.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: OutboundRequest);
}

/// Captures requests in memory instead of sending them.
#[derive(Default)]
pub struct RecordingFetcher {
    requests: Mutex<Vec<OutboundRequest>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<OutboundRequest> {
        std::mem::take(&mut *self.requests.lock())
    }
}

impl Fetcher for RecordingFetcher {
    fn fetch(&self, request: OutboundRequest) {
        self.requests.lock().push(request);
    }
}

#[derive(Default)]
struct InFlight {
    pending: AtomicUsize,
    idle: Notify,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl InFlight {
    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Totals reported by [`HttpFetcher::drain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sent: u64,
    pub failed: u64,
}

/// reqwest-backed fetcher. Each request runs as its own task on the runtime
/// the fetcher was created in.
pub struct HttpFetcher {
    client: reqwest::Client,
    handle: Handle,
    in_flight: Arc<InFlight>,
}

impl HttpFetcher {
    /// Must be called from within a tokio runtime.
    pub fn new(config: &HttpConfig) -> RelayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .gzip(config.gzip)
            .build()
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Self::from_client(client)
    }

    pub fn from_client(client: reqwest::Client) -> RelayResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| RelayError::Transport(format!("no tokio runtime: {e}")))?;

        Ok(Self {
            client,
            handle,
            in_flight: Arc::new(InFlight::default()),
        })
    }

    pub fn pending(&self) -> usize {
        self.in_flight.pending.load(Ordering::Acquire)
    }

    /// Wait for every spawned send to finish.
    pub async fn drain(&self) -> DeliveryStats {
        loop {
            let idle = self.in_flight.idle.notified();
            if self.pending() == 0 {
                break;
            }
            idle.await;
        }
        DeliveryStats {
            sent: self.in_flight.sent.load(Ordering::Relaxed),
            failed: self.in_flight.failed.load(Ordering::Relaxed),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: OutboundRequest) {
        let method = match reqwest::Method::from_bytes(request.method.as_bytes()) {
            Ok(m) => m,
            Err(e) => {
                warn!(method = %request.method, error = %e, "invalid request method");
                return;
            }
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let builder = builder.body(request.body);
        let url = request.url;

        let in_flight = Arc::clone(&self.in_flight);
        in_flight.pending.fetch_add(1, Ordering::AcqRel);

        self.handle.spawn(async move {
            match builder.send().await {
                Ok(resp) => {
                    in_flight.sent.fetch_add(1, Ordering::Relaxed);
                    debug!(url = %url, status = %resp.status(), "segment request sent");
                }
                Err(e) => {
                    in_flight.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(url = %url, error = %e, "segment request failed");
                }
            }
            in_flight.finish();
        });
    }
}
