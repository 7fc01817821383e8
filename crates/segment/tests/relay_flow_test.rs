//! End-to-end flow: host manager -> Segment component -> recorded request.

use std::sync::Arc;

use relay_core::client::{Client, ClientStore, MemoryClientStore, Scope};
use relay_core::config::SegmentSettings;
use relay_core::types::{ClientContext, ClientEvent, HostEventKind, PageUrl};
use relay_segment::identity::SequentialIdGenerator;
use relay_segment::{Manager, RecordingFetcher, SegmentComponent, ANONYMOUS_ID_COOKIE};
use serde_json::{json, Value};

struct Harness {
    manager: Manager,
    fetcher: Arc<RecordingFetcher>,
}

impl Harness {
    fn new() -> Self {
        let fetcher = Arc::new(RecordingFetcher::new());
        let manager = Manager::new(fetcher.clone());
        let component = Arc::new(SegmentComponent::with_id_generator(
            SegmentSettings::new("wk-live-123").with_hostname("events.example.net"),
            Arc::new(SequentialIdGenerator::new("anon")),
        ));
        component.register(&manager);
        Self { manager, fetcher }
    }

    /// Dispatch one event and return the JSON body that was sent.
    fn send(&self, kind: HostEventKind, payload: Value, store: &Arc<MemoryClientStore>) -> Value {
        let event = ClientEvent::new(
            payload.as_object().cloned().unwrap(),
            Client::new(browser_context(), store.clone()),
        );
        assert_eq!(self.manager.dispatch(kind, &event), 1);

        let request = self.fetcher.take().pop().expect("one request per event");
        serde_json::from_str(&request.body).unwrap()
    }
}

fn browser_context() -> ClientContext {
    ClientContext {
        ip: "198.51.100.23".into(),
        language: "de-DE".into(),
        url: PageUrl::parse("https://store.example.com/checkout?step=payment"),
        title: "Checkout".into(),
        referer: "https://store.example.com/cart".into(),
        screen_width: Some(390),
        screen_height: Some(844),
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15"
            .into(),
    }
}

#[test]
fn test_purchase_track_with_fresh_client() {
    let harness = Harness::new();
    let store = Arc::new(MemoryClientStore::new());

    let event = ClientEvent::new(
        json!({"event": "Purchase", "amount": 50, "trait-plan": "pro"})
            .as_object()
            .cloned()
            .unwrap(),
        Client::new(browser_context(), store.clone()),
    );
    harness.manager.dispatch(HostEventKind::Track, &event);

    let requests = harness.fetcher.take();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.url, "https://events.example.net/v1/track");
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("Authorization"), Some("Basic d2stbGl2ZS0xMjM="));
    assert_eq!(request.header("Content-Type"), Some("application/json"));

    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["event"], "Purchase");
    assert_eq!(body["properties"], json!({"amount": 50}));
    assert_eq!(body["context"]["traits"], json!({"plan": "pro"}));
    assert_eq!(body["anonymousId"], "anon-1");
    assert!(body.get("userId").is_none());
    assert_eq!(body["context"]["os"]["name"], "iOS");
    assert_eq!(body["context"]["locale"], "de-DE");

    let cookie = store.entry(ANONYMOUS_ID_COOKIE).unwrap();
    assert_eq!(cookie.value, "anon-1");
    assert_eq!(cookie.scope, Scope::Infinite);
}

#[test]
fn test_anonymous_id_stable_across_calls() {
    let harness = Harness::new();
    let store = Arc::new(MemoryClientStore::new());

    let first = harness.send(HostEventKind::Pageview, json!({}), &store);
    let second = harness.send(HostEventKind::Track, json!({"event": "Viewed"}), &store);
    let third = harness.send(HostEventKind::Group, json!({"groupId": "g-1"}), &store);

    assert_eq!(first["anonymousId"], "anon-1");
    assert_eq!(second["anonymousId"], "anon-1");
    assert_eq!(third["anonymousId"], "anon-1");
    assert_eq!(store.get(ANONYMOUS_ID_COOKIE).as_deref(), Some("anon-1"));
}

#[test]
fn test_separate_clients_get_separate_ids() {
    let harness = Harness::new();
    let a = Arc::new(MemoryClientStore::new());
    let b = Arc::new(MemoryClientStore::new());

    let from_a = harness.send(HostEventKind::Track, json!({"event": "X"}), &a);
    let from_b = harness.send(HostEventKind::Track, json!({"event": "X"}), &b);
    assert_ne!(from_a["anonymousId"], from_b["anonymousId"]);
}

#[test]
fn test_pageview_properties_mirror_page_context() {
    let harness = Harness::new();
    let store = Arc::new(MemoryClientStore::new());

    let body = harness.send(
        HostEventKind::Pageview,
        json!({"url": "https://spoofed.example", "search": "?x=1", "section": "checkout"}),
        &store,
    );

    let page = &body["context"]["page"];
    for key in ["url", "title", "referrer", "path", "search"] {
        assert_eq!(body["properties"][key], page[key], "{key}");
    }
    assert_eq!(body["properties"]["url"], "https://store.example.com/checkout?step=payment");
    assert_eq!(body["properties"]["path"], "/checkout");
    assert_eq!(body["properties"]["section"], "checkout");
    assert!(body.get("userId").is_none());
    assert!(body.get("event").is_none());
}

#[test]
fn test_identify_never_sets_context_traits() {
    let harness = Harness::new();
    let store = Arc::new(MemoryClientStore::new());

    let body = harness.send(
        HostEventKind::Identify,
        json!({
            "userId": "user-900",
            "trait-email": "grace@example.com",
            "trait-plan": "team",
            "plan": "free"
        }),
        &store,
    );

    assert!(body["context"].get("traits").is_none());
    assert_eq!(
        body["traits"],
        json!({"email": "grace@example.com", "plan": "team"})
    );
    assert_eq!(body["userId"], "user-900");
    // A known user id does not trigger anonymous id generation.
    assert!(body.get("anonymousId").is_none());
    assert!(store.is_empty());
}

#[test]
fn test_nulls_dropped_everywhere() {
    let harness = Harness::new();
    let store = Arc::new(MemoryClientStore::new());

    for (kind, body_key) in [
        (HostEventKind::Track, "properties"),
        (HostEventKind::Identify, "traits"),
        (HostEventKind::Alias, "properties"),
    ] {
        let body = harness.send(
            kind,
            json!({"event": "E", "coupon": null, "trait-company": null, "qty": 2}),
            &store,
        );
        let section = body[body_key].as_object().unwrap();
        assert!(!section.contains_key("coupon"), "{kind:?}");
        assert!(!section.contains_key("company"), "{kind:?}");
        assert_eq!(section["qty"], 2);
    }
}

#[test]
fn test_existing_cookie_is_used() {
    let harness = Harness::new();
    let store = Arc::new(MemoryClientStore::new().with_value(ANONYMOUS_ID_COOKIE, "legacy-42"));

    let body = harness.send(HostEventKind::Alias, json!({"userId": "user-1"}), &store);
    assert_eq!(body["anonymousId"], "legacy-42");
    assert_eq!(body["userId"], "user-1");
    assert_eq!(store.len(), 1);
}
