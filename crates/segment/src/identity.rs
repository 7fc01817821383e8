//! Anonymous id resolution: payload first, then the client cookie, then a
//! freshly generated id persisted back to the client.

use std::sync::atomic::{AtomicU64, Ordering};

use relay_core::client::{Client, SetOptions};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::payload::{truthy, SegmentPayload};

/// Cookie holding the anonymous id between events.
pub const ANONYMOUS_ID_COOKIE: &str = "ajs_anonymous_id";

/// Source of fresh anonymous ids.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Test fixture: deterministic ids (`<prefix>-1`, `<prefix>-2`, ...). Hosts
/// should use [`UuidGenerator`].
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

/// Where the outgoing identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Payload,
    Cookie,
    Generated,
    /// No anonymous id, but the user id identifies the caller.
    UserIdOnly,
}

/// Fill in `anonymous_id` on the payload. Never touches `user_id`.
pub fn resolve_identity(
    payload: &mut SegmentPayload,
    client: &Client,
    ids: &dyn IdGenerator,
) -> IdentitySource {
    if truthy(payload.anonymous_id.as_ref()) {
        return IdentitySource::Payload;
    }

    if let Some(stored) = client.get(ANONYMOUS_ID_COOKIE).filter(|v| !v.is_empty()) {
        payload.anonymous_id = Some(Value::String(stored));
        return IdentitySource::Cookie;
    }

    if truthy(payload.user_id.as_ref()) {
        return IdentitySource::UserIdOnly;
    }

    let anon_id = ids.generate();
    if !client.set(ANONYMOUS_ID_COOKIE, &anon_id, SetOptions::infinite()) {
        debug!("client store refused anonymous id write");
    }
    payload.anonymous_id = Some(Value::String(anon_id));
    IdentitySource::Generated
}
