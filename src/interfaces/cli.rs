use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rqc")]
#[command(about = "Cached, coalescing and batching HTTP request runner.")]
#[command(version)]
pub struct Cli {
    /// HTTP method (GET, POST, PUT, DELETE)
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Query parameter as key=value (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// JSON request body
    #[arg(short = 'd', long)]
    pub body: Option<String>,

    /// Issue the request this many times concurrently
    #[arg(short = 'r', long, default_value_t = 1)]
    pub repeat: usize,

    /// Send through the batch window instead of the cache
    #[arg(long)]
    pub batch: bool,

    /// Warm the cache from a JSON array of requests
    #[arg(long, value_name = "FILE")]
    pub preload: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Choose color theme
    #[arg(short = 'T', long)]
    pub theme: Option<String>,

    /// Generate config sample
    #[arg(long)]
    pub generate_config: bool,

    /// Show status
    #[arg(long)]
    pub status: bool,

    /// Request URL, relative to the configured base URL
    pub url: Option<String>,
}

/// Parse `key=value` pairs into a JSON object. Values that parse as JSON
/// keep their type; anything else is a string.
pub fn parse_params(pairs: &[String]) -> Result<serde_json::Value, String> {
    let mut map = serde_json::Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("invalid parameter '{}', expected key=value", pair))?;
        if key.is_empty() {
            return Err(format!("invalid parameter '{}', empty key", pair));
        }
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        map.insert(key.to_string(), value);
    }
    if map.is_empty() {
        Ok(serde_json::Value::Null)
    } else {
        Ok(serde_json::Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_params() {
        let params = parse_params(&[
            "page=2".to_string(),
            "name=alice".to_string(),
            "active=true".to_string(),
        ])
        .unwrap();
        assert_eq!(params, json!({ "page": 2, "name": "alice", "active": true }));
    }

    #[test]
    fn test_parse_params_empty_and_invalid() {
        assert_eq!(parse_params(&[]).unwrap(), serde_json::Value::Null);
        assert!(parse_params(&["novalue".to_string()]).is_err());
        assert!(parse_params(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from(["rqc", "-X", "post", "-d", "{\"a\":1}", "-r", "3", "/users"]);
        assert_eq!(cli.method, "post");
        assert_eq!(cli.body.as_deref(), Some("{\"a\":1}"));
        assert_eq!(cli.repeat, 3);
        assert_eq!(cli.url.as_deref(), Some("/users"));
        assert!(!cli.batch);
    }
}
