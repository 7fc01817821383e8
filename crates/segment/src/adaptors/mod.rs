//! Adaptors for translating host client events into destination payloads.
//!
//! Each adaptor implements [`EventAdaptor`] to transform a [`ClientEvent`]
//! into the JSON body expected by its target API.

pub mod segment;

use relay_core::error::RelayResult;
use relay_core::types::{CallType, ClientEvent};

/// Adaptor trait: transforms client events into a destination-specific JSON
/// payload.
pub trait EventAdaptor: Send + Sync {
    /// Destination identifier (e.g. "segment").
    fn platform(&self) -> &str;

    /// Transform a client event into the destination's payload format.
    fn transform(&self, call: CallType, event: &ClientEvent) -> RelayResult<serde_json::Value>;

    /// Validate that the adaptor configuration is usable.
    fn validate_config(&self) -> RelayResult<()>;
}
