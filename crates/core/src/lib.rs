pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{Client, ClientStore, MemoryClientStore};
pub use config::AppConfig;
pub use error::{RelayError, RelayResult};
pub use types::{CallType, ClientContext, ClientEvent, HostEventKind};
