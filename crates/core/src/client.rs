//! Client handle: browser metadata plus the cookie-like key/value store the
//! host exposes for each client.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::ClientContext;

/// Lifetime of a value written to the client store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Page,
    #[default]
    Session,
    Infinite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub scope: Scope,
}

impl SetOptions {
    pub fn infinite() -> Self {
        Self {
            scope: Scope::Infinite,
        }
    }
}

/// Key/value storage persisted on the client between events.
pub trait ClientStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value. Returns false when the store refused the write.
    fn set(&self, key: &str, value: &str, options: SetOptions) -> bool;
}

#[derive(Debug, Clone)]
pub struct StoredValue {
    pub value: String,
    pub scope: Scope,
    pub set_at: DateTime<Utc>,
}

/// In-process store used by the CLI host and tests.
#[derive(Debug, Default)]
pub struct MemoryClientStore {
    values: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.set(key, value, SetOptions::default());
        self
    }

    pub fn entry(&self, key: &str) -> Option<StoredValue> {
        self.values.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl ClientStore for MemoryClientStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).map(|v| v.value.clone())
    }

    fn set(&self, key: &str, value: &str, options: SetOptions) -> bool {
        self.values.write().insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                scope: options.scope,
                set_at: Utc::now(),
            },
        );
        true
    }
}

/// The client an event originated from.
#[derive(Clone)]
pub struct Client {
    pub context: ClientContext,
    store: Arc<dyn ClientStore>,
}

impl Client {
    pub fn new(context: ClientContext, store: Arc<dyn ClientStore>) -> Self {
        Self { context, store }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    pub fn set(&self, key: &str, value: &str, options: SetOptions) -> bool {
        self.store.set(key, value, options)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
