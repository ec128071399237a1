use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

// HTTP 方法
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method: {}", other)),
        }
    }
}

// 请求描述
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestSpec {
    #[serde(default)]
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub params: Value, // 查询参数 (JSON object 或 null)
    #[serde(default)]
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>, params: Value) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params,
            body: None,
        }
    }

    pub fn with_body(method: Method, url: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Value::Null,
            body,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.method, &self.url, &self.params)
    }
}

// 响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
    pub source: ResponseSource,
    pub received_at: i64, // unix millis
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            source: ResponseSource::Network,
            received_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn from_cache(mut self) -> Self {
        self.source = ResponseSource::Cache;
        self
    }

    pub fn is_cached(&self) -> bool {
        self.source == ResponseSource::Cache
    }
}

// 响应来源
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
}

/// Deterministic identity of a logically equivalent request.
///
/// Derived from the method, the URL and the serialized parameters. Object
/// parameters serialize with sorted keys (serde_json's default map is a
/// `BTreeMap`), so `{"a":1,"b":2}` and `{"b":2,"a":1}` share a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(method: Method, url: &str, params: &Value) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(method.as_str());
        hasher.update(b"\n");
        hasher.update(url);
        hasher.update(b"\n");
        hasher.update(params.to_string());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log output.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"page":1,"size":20}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"size":20,"page":1}"#).unwrap();
        assert_eq!(
            Fingerprint::new(Method::Get, "/users", &a),
            Fingerprint::new(Method::Get, "/users", &b)
        );
    }

    #[test]
    fn test_fingerprint_distinguishes_method_url_and_params() {
        let params = json!({ "page": 1 });
        let base = Fingerprint::new(Method::Get, "/users", &params);

        assert_ne!(base, Fingerprint::new(Method::Post, "/users", &params));
        assert_ne!(base, Fingerprint::new(Method::Get, "/roles", &params));
        assert_ne!(
            base,
            Fingerprint::new(Method::Get, "/users", &json!({ "page": 2 }))
        );
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = Fingerprint::new(Method::Get, "/users", &Value::Null);
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp.short().len(), 12);
    }

    #[test]
    fn test_request_spec_from_json() {
        let spec: RequestSpec =
            serde_json::from_str(r#"{"url":"/products","params":{"q":"x"}}"#).unwrap();
        assert_eq!(spec.method, Method::Get);
        assert_eq!(spec.params, json!({ "q": "x" }));
        assert!(spec.body.is_none());

        let spec: RequestSpec =
            serde_json::from_str(r#"{"method":"DELETE","url":"/products/1"}"#).unwrap();
        assert_eq!(spec.method, Method::Delete);
        assert_eq!(spec.params, Value::Null);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Put".parse::<Method>().unwrap(), Method::Put);
        assert!("PATCH".parse::<Method>().is_err());
    }

    #[test]
    fn test_response_from_cache_tags_source() {
        let resp = Response::new(200, json!({ "ok": true }));
        assert!(!resp.is_cached());
        assert!(resp.from_cache().is_cached());
    }
}
