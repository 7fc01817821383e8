//! Field classifier: splits a flat event payload into identity traits and
//! free-form properties.

use serde_json::{Map, Value};

/// Prefix marking a payload key as a user trait.
pub const TRAIT_PREFIX: &str = "trait-";

/// Control fields that never become properties.
pub const RESERVED_FIELDS: [&str; 4] = ["userId", "anonymousId", "callType", "event"];

/// Payload fields sorted into traits and properties. Null values are absent
/// from both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedFields {
    pub traits: Map<String, Value>,
    pub properties: Map<String, Value>,
}

impl ClassifiedFields {
    /// Properties overlaid with traits; traits win on key collision.
    pub fn merged_traits(&self) -> Map<String, Value> {
        let mut merged = self.properties.clone();
        for (key, value) in &self.traits {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

pub fn is_reserved(key: &str) -> bool {
    RESERVED_FIELDS.contains(&key)
}

pub fn classify(payload: &Map<String, Value>) -> ClassifiedFields {
    let mut fields = ClassifiedFields::default();

    for (key, value) in payload {
        if value.is_null() {
            continue;
        }
        if let Some(name) = key.strip_prefix(TRAIT_PREFIX) {
            fields.traits.insert(name.to_string(), value.clone());
        } else if !is_reserved(key) {
            fields.properties.insert(key.clone(), value.clone());
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_splits_traits_and_properties() {
        let fields = classify(&payload(json!({
            "trait-plan": "pro",
            "trait-email": "ada@example.com",
            "amount": 50,
            "currency": "EUR"
        })));

        assert_eq!(fields.traits, payload(json!({"plan": "pro", "email": "ada@example.com"})));
        assert_eq!(fields.properties, payload(json!({"amount": 50, "currency": "EUR"})));
    }

    #[test]
    fn test_reserved_fields_excluded() {
        let fields = classify(&payload(json!({
            "userId": "u-1",
            "anonymousId": "a-1",
            "callType": "track",
            "event": "Signed Up",
            "source": "footer"
        })));

        assert!(fields.traits.is_empty());
        assert_eq!(fields.properties, payload(json!({"source": "footer"})));
    }

    #[test]
    fn test_null_values_dropped() {
        let fields = classify(&payload(json!({
            "trait-company": null,
            "coupon": null,
            "sku": "SKU-9"
        })));

        assert!(fields.traits.is_empty());
        assert_eq!(fields.properties.len(), 1);
        assert!(!fields.properties.contains_key("coupon"));
    }

    #[test]
    fn test_falsy_values_kept() {
        let fields = classify(&payload(json!({
            "trait-vip": false,
            "quantity": 0,
            "note": ""
        })));

        assert_eq!(fields.traits["vip"], false);
        assert_eq!(fields.properties["quantity"], 0);
        assert_eq!(fields.properties["note"], "");
    }

    #[test]
    fn test_prefixed_reserved_name_is_a_trait() {
        let fields = classify(&payload(json!({"trait-userId": "shadow"})));
        assert_eq!(fields.traits["userId"], "shadow");
        assert!(fields.properties.is_empty());
    }

    #[test]
    fn test_merged_traits_prefer_traits() {
        let fields = classify(&payload(json!({
            "name": "from property",
            "trait-name": "from trait",
            "age": 41
        })));

        let merged = fields.merged_traits();
        assert_eq!(merged["name"], "from trait");
        assert_eq!(merged["age"], 41);
    }
}
