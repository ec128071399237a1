//! Configuration parsing tests

use reqcoord::infrastructure::config::{parse_config, Config};
use std::time::Duration;

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.theme, "default");
    assert_eq!(config.cache.capacity, 100);
    assert_eq!(config.cache.ttl(), Duration::from_secs(5 * 60));
    assert_eq!(config.batch.window_delay(), Duration::from_millis(50));
    assert_eq!(config.transport.base_url, "http://localhost:8080/api");
    assert_eq!(config.transport.timeout(), Duration::from_secs(10));
    assert!(config.transport.user_agent.starts_with("reqcoord/"));
}

#[test]
fn test_config_toml_format() {
    let toml_content = r#"
theme = "plain"

[cache]
capacity = 500
ttl_secs = 30

[batch]
window_delay_ms = 10

[transport]
base_url = "https://admin.example.com/api"
timeout_secs = 3

[logging]
enable = true
path = "/tmp/test.log"
level = "DEBUG"
"#;

    let config = parse_config(toml_content).unwrap();
    assert_eq!(config.theme, "plain");
    assert_eq!(config.cache.capacity, 500);
    assert_eq!(config.cache.ttl(), Duration::from_secs(30));
    assert_eq!(config.batch.window_delay(), Duration::from_millis(10));
    assert_eq!(config.transport.base_url, "https://admin.example.com/api");
    assert_eq!(config.transport.timeout(), Duration::from_secs(3));
    assert_eq!(config.logging.path.as_deref(), Some("/tmp/test.log"));
    assert_eq!(config.logging.level, "DEBUG");
}

#[test]
fn test_config_round_trips_through_toml() {
    let sample = toml::to_string_pretty(&Config::default()).unwrap();
    assert!(sample.contains("[cache]"));
    assert!(sample.contains("window_delay_ms = 50"));

    let parsed = parse_config(&sample).unwrap();
    assert_eq!(parsed.cache, Config::default().cache);
    assert_eq!(parsed.transport, Config::default().transport);
}
