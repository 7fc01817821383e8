//! Host manager: components register listeners per event kind; the host
//! dispatches each incoming client event to them and lends them its fetch
//! primitive.

use std::sync::Arc;

use dashmap::DashMap;
use relay_core::types::{ClientEvent, HostEventKind};
use tracing::{debug, info};

use crate::transport::{Fetcher, OutboundRequest};

/// Event listener. Receives the manager so it can reach [`Manager::fetch`].
pub type Listener = Arc<dyn Fn(&Manager, &ClientEvent) + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Manager, &ClientEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub struct Manager {
    listeners: DashMap<HostEventKind, Vec<Listener>>,
    fetcher: Arc<dyn Fetcher>,
}

impl Manager {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            listeners: DashMap::new(),
            fetcher,
        }
    }

    pub fn add_event_listener(&self, kind: HostEventKind, listener: Listener) {
        self.listeners.entry(kind).or_default().push(listener);
        info!(kind = kind.as_str(), "event listener registered");
    }

    pub fn listener_count(&self, kind: HostEventKind) -> usize {
        self.listeners.get(&kind).map(|l| l.len()).unwrap_or(0)
    }

    /// Run every listener registered for `kind`, in registration order.
    /// Returns how many ran.
    pub fn dispatch(&self, kind: HostEventKind, event: &ClientEvent) -> usize {
        // Clone out so listeners may register more listeners without
        // deadlocking on the map shard.
        let listeners = match self.listeners.get(&kind) {
            Some(entry) => entry.value().clone(),
            None => {
                debug!(kind = kind.as_str(), "no listeners for event");
                return 0;
            }
        };

        for listener in &listeners {
            listener(self, event);
        }
        listeners.len()
    }

    pub fn fetch(&self, request: OutboundRequest) {
        self.fetcher.fetch(request);
    }
}
