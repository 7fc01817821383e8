//! The Segment component: registers one listener per host event kind and
//! relays each event to the Segment HTTP Tracking API.

use std::sync::Arc;

use relay_core::config::SegmentSettings;
use relay_core::types::{CallType, ClientEvent, HostEventKind};
use tracing::{debug, info, warn};

use crate::adaptors::segment::SegmentAdaptor;
use crate::identity::IdGenerator;
use crate::manager::{listener, Manager};
use crate::transport::build_request;

pub struct SegmentComponent {
    adaptor: SegmentAdaptor,
}

impl SegmentComponent {
    pub fn new(settings: SegmentSettings) -> Self {
        Self {
            adaptor: SegmentAdaptor::new(settings),
        }
    }

    pub fn with_id_generator(settings: SegmentSettings, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            adaptor: SegmentAdaptor::with_id_generator(settings, ids),
        }
    }

    pub fn adaptor(&self) -> &SegmentAdaptor {
        &self.adaptor
    }

    /// Register listeners for pageview, track, identify, alias and group.
    pub fn register(self: Arc<Self>, manager: &Manager) {
        for kind in HostEventKind::ALL {
            let component = Arc::clone(&self);
            let call = CallType::from(kind);
            manager.add_event_listener(
                kind,
                listener(move |m, event| component.normalize_and_send(call, m, event)),
            );
        }
        info!(
            hostname = %self.adaptor.settings().hostname,
            "segment component registered"
        );
    }

    /// Shape one event and hand the request to the host's fetcher. Never
    /// fails: build errors are logged and the event is dropped.
    pub fn normalize_and_send(&self, call: CallType, manager: &Manager, event: &ClientEvent) {
        let payload = self.adaptor.build_payload(call, event);

        match build_request(self.adaptor.settings(), call, &payload) {
            Ok(request) => {
                debug!(url = %request.url, "dispatching segment call");
                manager.fetch(request);
            }
            Err(e) => {
                warn!(call = call.path_segment(), error = %e, "failed to build segment request");
            }
        }
    }
}
