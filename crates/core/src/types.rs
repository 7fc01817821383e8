use serde::{Deserialize, Deserializer, Serialize};

use crate::client::Client;

/// Event kinds the host dispatches to registered listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostEventKind {
    Pageview,
    Track,
    Identify,
    Alias,
    Group,
}

impl HostEventKind {
    pub const ALL: [HostEventKind; 5] = [
        HostEventKind::Pageview,
        HostEventKind::Track,
        HostEventKind::Identify,
        HostEventKind::Alias,
        HostEventKind::Group,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HostEventKind::Pageview => "pageview",
            HostEventKind::Track => "track",
            HostEventKind::Identify => "identify",
            HostEventKind::Alias => "alias",
            HostEventKind::Group => "group",
        }
    }
}

/// Call types of the Segment HTTP Tracking API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Page,
    Track,
    Identify,
    Alias,
    Group,
}

impl CallType {
    /// Path segment under `/v1/` for this call.
    pub fn path_segment(&self) -> &'static str {
        match self {
            CallType::Page => "page",
            CallType::Track => "track",
            CallType::Identify => "identify",
            CallType::Alias => "alias",
            CallType::Group => "group",
        }
    }

    /// Calls whose body is `traits` rather than `properties`.
    pub fn carries_traits(&self) -> bool {
        matches!(self, CallType::Identify | CallType::Group)
    }
}

impl From<HostEventKind> for CallType {
    fn from(kind: HostEventKind) -> Self {
        match kind {
            HostEventKind::Pageview => CallType::Page,
            HostEventKind::Track => CallType::Track,
            HostEventKind::Identify => CallType::Identify,
            HostEventKind::Alias => CallType::Alias,
            HostEventKind::Group => CallType::Group,
        }
    }
}

/// Location of the page the event was captured on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPageUrl")]
pub struct PageUrl {
    pub href: String,
    pub pathname: String,
    pub search: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPageUrl {
    Href(String),
    Parts {
        #[serde(default, deserialize_with = "null_as_empty")]
        href: String,
        #[serde(default, deserialize_with = "null_as_empty")]
        pathname: String,
        #[serde(default, deserialize_with = "null_as_empty")]
        search: String,
    },
}

impl From<RawPageUrl> for PageUrl {
    fn from(raw: RawPageUrl) -> Self {
        match raw {
            RawPageUrl::Href(href) => PageUrl::parse(&href),
            RawPageUrl::Parts {
                href,
                pathname,
                search,
            } => PageUrl {
                href,
                pathname,
                search,
            },
        }
    }
}

impl PageUrl {
    /// Split an href into path and search parts. Unparseable hrefs keep the
    /// raw string with empty parts.
    pub fn parse(href: &str) -> Self {
        match url::Url::parse(href) {
            Ok(parsed) => PageUrl {
                href: href.to_string(),
                pathname: parsed.path().to_string(),
                search: parsed
                    .query()
                    .filter(|q| !q.is_empty())
                    .map(|q| format!("?{q}"))
                    .unwrap_or_default(),
            },
            Err(_) => PageUrl {
                href: href.to_string(),
                ..Default::default()
            },
        }
    }
}

/// Browser metadata supplied by the host with every event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientContext {
    #[serde(deserialize_with = "null_as_empty")]
    pub ip: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub language: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: PageUrl,
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub referer: String,
    #[serde(deserialize_with = "loose_dimension")]
    pub screen_width: Option<u32>,
    #[serde(deserialize_with = "loose_dimension")]
    pub screen_height: Option<u32>,
    #[serde(deserialize_with = "null_as_empty")]
    pub user_agent: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Screen sizes arrive as whatever number the browser reported. Fractional
/// values are rounded; negatives and non-numbers are dropped.
fn loose_dimension<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u32::MAX as f64)
        .map(|f| f.round() as u32))
}

/// A single event as delivered by the host.
pub struct ClientEvent {
    pub payload: serde_json::Map<String, serde_json::Value>,
    pub client: Client,
}

impl ClientEvent {
    pub fn new(payload: serde_json::Map<String, serde_json::Value>, client: Client) -> Self {
        Self { payload, client }
    }
}
