//! Segment HTTP Tracking API payload types.

use serde::Serialize;
use serde_json::{Map, Value};

/// Body of a single Segment call. Absent fields are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymous_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    pub context: SegmentContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentContext {
    pub ip: String,
    pub locale: String,
    pub page: PageContext,
    pub screen: ScreenContext,
    pub os: OsContext,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageContext {
    pub url: String,
    pub title: String,
    pub referrer: String,
    pub path: String,
    pub search: String,
}

impl PageContext {
    /// Page fields as property entries, in wire order.
    pub fn entries(&self) -> [(&'static str, Value); 5] {
        [
            ("url", Value::String(self.url.clone())),
            ("title", Value::String(self.title.clone())),
            ("referrer", Value::String(self.referrer.clone())),
            ("path", Value::String(self.path.clone())),
            ("search", Value::String(self.search.clone())),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScreenContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OsContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Loose truthiness used for identity fields: null, `false`, `0` and `""`
/// count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn truthy(value: Option<&Value>) -> bool {
    value.map(is_truthy).unwrap_or(false)
}
