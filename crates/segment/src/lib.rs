//! Segment destination: turns host client events (page views, track,
//! identify, alias, group) into Segment HTTP Tracking API calls.
//!
//! # Modules
//!
//! - [`classifier`]: Splits flat payloads into traits and properties
//! - [`payload`]: Outgoing Segment payload types
//! - [`adaptors`]: Per-call shaping into the destination format
//! - [`identity`]: Anonymous id resolution and persistence
//! - [`user_agent`]: OS detection from the raw user-agent header
//! - [`transport`]: Request building and fire-and-forget fetchers
//! - [`manager`]: Host dispatcher that listeners register with
//! - [`component`]: The registered Segment component

pub mod adaptors;
pub mod classifier;
pub mod component;
pub mod identity;
pub mod manager;
pub mod payload;
pub mod transport;
pub mod user_agent;

pub use adaptors::segment::SegmentAdaptor;
pub use adaptors::EventAdaptor;
pub use component::SegmentComponent;
pub use identity::{IdGenerator, UuidGenerator, ANONYMOUS_ID_COOKIE};
pub use manager::Manager;
pub use payload::SegmentPayload;
pub use transport::{Fetcher, HttpFetcher, OutboundRequest, RecordingFetcher};
