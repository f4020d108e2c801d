//! The captured-request record shared by every hookwatch component

use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// One logged inbound or simulated HTTP request.
///
/// Records are immutable once built: the builder methods consume `self`
/// and are only meant to be used while a capture source assembles one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedRequest {
    /// Unique within a request store
    pub id: String,
    /// HTTP verb, upper case
    pub method: String,
    /// URL or path that was captured
    pub path: String,
    /// Capture time on the local clock
    pub timestamp: DateTime<Utc>,
    pub headers: BTreeMap<String, String>,
    /// Unvalidated JSON payload
    pub body: Value,
    pub query_params: BTreeMap<String, String>,
}

impl CapturedRequest {
    /// Creates a record with a fresh id, the current time and empty payload
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            timestamp: Utc::now(),
            headers: BTreeMap::new(),
            body: Value::Null,
            query_params: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_query_params(mut self, query_params: BTreeMap<String, String>) -> Self {
        self.query_params = query_params;
        self
    }

    /// "METHOD path", as shown in list rows and the detail title
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Pretty JSON with two-space indentation
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// The headers as a JSON object, for tree rendering
    pub fn headers_value(&self) -> Value {
        map_to_value(&self.headers)
    }

    /// The query parameters as a JSON object, for tree rendering
    pub fn query_params_value(&self) -> Value {
        map_to_value(&self.query_params)
    }
}

fn map_to_value(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Flattens HTTP headers. Names are lower case; repeated headers
/// are joined with ", ".
pub fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = value
            .to_str()
            .map(str::to_string)
            .unwrap_or_else(|_| String::from_utf8_lossy(value.as_bytes()).into_owned());
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}

/// Flattens a loosely typed JSON map into string values.
///
/// Strings are kept as-is, everything else uses its compact JSON text.
pub fn stringify_values(map: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_header_map_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append("Set-Cookie", HeaderValue::from_static("a=1"));
        headers.append("Set-Cookie", HeaderValue::from_static("b=2"));
        headers.insert("X-Hub-Signature", HeaderValue::from_static("sha1=abc"));

        let map = header_map(&headers);
        assert_eq!(map["set-cookie"], "a=1, b=2");
        assert_eq!(map["x-hub-signature"], "sha1=abc");
    }

    #[test]
    fn test_new_uppercases_method_and_assigns_id() {
        let a = CapturedRequest::new("post", "/webhook");
        let b = CapturedRequest::new("post", "/webhook");
        assert_eq!(a.method, "POST");
        assert_ne!(a.id, b.id);
        assert_eq!(a.body, Value::Null);
    }

    #[test]
    fn test_serializes_query_params_in_camel_case() {
        let mut params = BTreeMap::new();
        params.insert("page".to_string(), "2".to_string());
        let request = CapturedRequest::new("GET", "/items").with_query_params(params);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["queryParams"], json!({"page": "2"}));
        assert!(value.get("query_params").is_none());
    }

    #[test]
    fn test_label() {
        let request = CapturedRequest::new("POST", "/webhook");
        assert_eq!(request.label(), "POST /webhook");
    }

    #[test]
    fn test_stringify_values() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), json!("text"));
        map.insert("b".to_string(), json!(42));
        map.insert("c".to_string(), json!(true));

        let out = stringify_values(map);
        assert_eq!(out["a"], "text");
        assert_eq!(out["b"], "42");
        assert_eq!(out["c"], "true");
    }
}
