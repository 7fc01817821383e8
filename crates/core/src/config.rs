use serde::Deserialize;

/// Root relay configuration. Loaded from environment variables with the
/// prefix `SEGMENT_RELAY__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub segment: SegmentSettings,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Destination settings handed to the Segment component.
///
/// Accepts both snake_case (environment) and camelCase (host settings) keys.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentSettings {
    #[serde(default, alias = "writeKey")]
    pub write_key: String,
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_gzip")]
    pub gzip: bool,
}

fn default_node_id() -> String {
    "relay-01".to_string()
}
pub fn default_hostname() -> String {
    "api.segment.io".to_string()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_gzip() -> bool {
    true
}

impl SegmentSettings {
    pub fn new(write_key: impl Into<String>) -> Self {
        Self {
            write_key: write_key.into(),
            hostname: default_hostname(),
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }
}

impl Default for SegmentSettings {
    fn default() -> Self {
        Self {
            write_key: String::new(),
            hostname: default_hostname(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            gzip: default_gzip(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            segment: SegmentSettings::default(),
            http: HttpConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SEGMENT_RELAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.node_id, "relay-01");
        assert_eq!(config.segment.hostname, "api.segment.io");
        assert!(config.segment.write_key.is_empty());
        assert_eq!(config.http.timeout_ms, 10_000);
        assert!(config.http.gzip);
    }

    #[test]
    fn test_host_settings_camel_case() {
        let settings: SegmentSettings =
            serde_json::from_value(serde_json::json!({ "writeKey": "wk-123" })).unwrap();
        assert_eq!(settings.write_key, "wk-123");
        assert_eq!(settings.hostname, "api.segment.io");

        let settings: SegmentSettings = serde_json::from_value(serde_json::json!({
            "write_key": "wk-456",
            "hostname": "events.eu1.segmentapis.com"
        }))
        .unwrap();
        assert_eq!(settings.write_key, "wk-456");
        assert_eq!(settings.hostname, "events.eu1.segmentapis.com");
    }

    #[test]
    fn test_partial_app_config() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "segment": { "write_key": "abc" },
            "http": { "timeout_ms": 2500 }
        }))
        .unwrap();
        assert_eq!(config.node_id, "relay-01");
        assert_eq!(config.segment.write_key, "abc");
        assert_eq!(config.http.timeout_ms, 2500);
        assert!(config.http.gzip);
    }
}
