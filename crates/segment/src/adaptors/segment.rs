//! Segment HTTP Tracking API adaptor: shapes client events into page,
//! track, identify, alias and group call bodies.

use std::sync::Arc;

use relay_core::config::SegmentSettings;
use relay_core::error::{RelayError, RelayResult};
use relay_core::types::{CallType, ClientContext, ClientEvent};
use tracing::debug;

use super::EventAdaptor;
use crate::classifier::{classify, ClassifiedFields};
use crate::identity::{resolve_identity, IdGenerator, UuidGenerator};
use crate::payload::{
    is_truthy, OsContext, PageContext, ScreenContext, SegmentContext, SegmentPayload,
};
use crate::user_agent::parse_user_agent;

/// Segment adaptor. Holds the destination settings and the id source used
/// when a client has no identity yet.
pub struct SegmentAdaptor {
    settings: SegmentSettings,
    ids: Arc<dyn IdGenerator>,
}

impl SegmentAdaptor {
    pub fn new(settings: SegmentSettings) -> Self {
        Self::with_id_generator(settings, Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(settings: SegmentSettings, ids: Arc<dyn IdGenerator>) -> Self {
        Self { settings, ids }
    }

    pub fn settings(&self) -> &SegmentSettings {
        &self.settings
    }

    /// Build the outgoing body for one call. Writes the anonymous id cookie
    /// when the client has no identity at all.
    pub fn build_payload(&self, call: CallType, event: &ClientEvent) -> SegmentPayload {
        let fields = classify(&event.payload);
        let mut payload = SegmentPayload {
            context: Self::build_context(call, &event.client.context, &fields),
            ..Default::default()
        };

        if call != CallType::Page {
            payload.event = event.payload.get("event").filter(|v| is_truthy(v)).cloned();
            payload.anonymous_id = event
                .payload
                .get("anonymousId")
                .filter(|v| !v.is_null())
                .cloned();
            payload.user_id = event.payload.get("userId").filter(|v| !v.is_null()).cloned();
        }

        if call.carries_traits() {
            payload.traits = Some(fields.merged_traits());
        } else {
            payload.properties = Some(fields.properties);
        }

        if call == CallType::Page {
            let properties = payload.properties.get_or_insert_with(Default::default);
            for (key, value) in payload.context.page.entries() {
                properties.insert(key.to_string(), value);
            }
        }

        let source = resolve_identity(&mut payload, &event.client, self.ids.as_ref());

        debug!(
            call = call.path_segment(),
            identity = ?source,
            "segment payload built"
        );

        payload
    }

    fn build_context(
        call: CallType,
        client: &ClientContext,
        fields: &ClassifiedFields,
    ) -> SegmentContext {
        let agent = parse_user_agent(&client.user_agent);

        let traits = if call != CallType::Identify && !fields.traits.is_empty() {
            Some(fields.traits.clone())
        } else {
            None
        };

        SegmentContext {
            ip: client.ip.clone(),
            locale: client.language.clone(),
            page: PageContext {
                url: client.url.href.clone(),
                title: client.title.clone(),
                referrer: client.referer.clone(),
                path: client.url.pathname.clone(),
                search: client.url.search.clone(),
            },
            screen: ScreenContext {
                width: client.screen_width,
                height: client.screen_height,
            },
            os: OsContext {
                name: agent.os_name,
            },
            user_agent: agent.ua,
            traits,
        }
    }
}

impl EventAdaptor for SegmentAdaptor {
    fn platform(&self) -> &str {
        "segment"
    }

    fn transform(&self, call: CallType, event: &ClientEvent) -> RelayResult<serde_json::Value> {
        let payload = self.build_payload(call, event);
        Ok(serde_json::to_value(payload)?)
    }

    fn validate_config(&self) -> RelayResult<()> {
        if self.settings.write_key.is_empty() {
            return Err(RelayError::Config(
                "Segment write_key must not be empty".to_string(),
            ));
        }
        if self.settings.hostname.is_empty() {
            return Err(RelayError::Config(
                "Segment hostname must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
