// HTTP transport backed by reqwest
use crate::domain::error::{CoordError, TransportError};
use crate::domain::model::{Method, RequestSpec, Response};
use crate::domain::traits::Transport;
use crate::infrastructure::config::TransportConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// Create a default HTTP client with appropriate settings
pub fn create_client(config: &TransportConfig) -> Result<Client, CoordError> {
    Ok(Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()?)
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self, CoordError> {
        Ok(Self::new(create_client(config)?, config.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestSpec) -> Result<Response, TransportError> {
        let url = join_url(&self.base_url, &request.url);
        tracing::debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .query(&query_pairs(&request.params));
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let message = if bytes.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                String::from_utf8_lossy(&bytes).chars().take(200).collect()
            };
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Response::new(status.as_u16(), decode_body(&bytes)))
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_decode() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

/// Join a request URL onto the base URL unless it is already absolute.
pub fn join_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if base.is_empty() {
        return url.to_string();
    }
    format!("{}/{}", base, url.trim_start_matches('/'))
}

/// Flatten object params into query pairs. Strings go out unquoted, other
/// values as their JSON text. Non-object params produce no query.
pub fn query_pairs(params: &Value) -> Vec<(String, String)> {
    match params {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h/api", "/users"), "http://h/api/users");
        assert_eq!(join_url("http://h/api/", "users"), "http://h/api/users");
        assert_eq!(join_url("http://h/api", "https://x/y"), "https://x/y");
        assert_eq!(join_url("", "/users"), "/users");
    }

    #[test]
    fn test_query_pairs() {
        let pairs = query_pairs(&json!({ "q": "alice", "page": 2, "skip": null }));
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "alice".to_string()),
            ]
        );
        assert!(query_pairs(&Value::Null).is_empty());
        assert!(query_pairs(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(br#"{"a":1}"#), json!({ "a": 1 }));
        assert_eq!(decode_body(b"plain text"), json!("plain text"));
    }

    #[test]
    fn test_from_config() {
        let transport = HttpTransport::from_config(&TransportConfig::default()).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8080/api");
    }
}
