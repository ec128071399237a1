// Main entry point
mod interfaces;
mod presentation;

use clap::Parser;
use colored::Colorize;
use futures_util::future::join_all;
use interfaces::cli::{parse_params, Cli};
use presentation::theme::Theme;
use reqcoord::domain::error::CoordError;
use reqcoord::domain::model::{Method, RequestSpec, Response};
use reqcoord::infrastructure::config::{self, load_config};
use reqcoord::state::AppState;
use reqcoord::ClientStats;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup graceful shutdown handler
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for shutdown signal: {}", e);
        } else {
            eprintln!("\nInterrupted, shutting down...");
            let _ = shutdown_tx.send(());
        }
    });

    let cli = Cli::parse();
    let config = load_config()?;

    if config.logging.enable {
        init_logging(&config.logging)?;
    }

    if cli.generate_config {
        config::generate_config_sample()?;
        return Ok(());
    }

    let theme_name = cli.theme.as_deref().unwrap_or(config.theme.as_str());
    let theme = Theme::from_name(theme_name);
    let state = AppState::new(config)?;

    if cli.status {
        print_status(&state).await;
        return Ok(());
    }

    if let Some(path) = &cli.preload {
        let content = tokio::fs::read_to_string(path).await?;
        let requests: Vec<RequestSpec> = serde_json::from_str(&content)?;
        let succeeded = state.client.preload(&requests).await;
        println!(
            "Preloaded {}/{} requests",
            succeeded.to_string().green(),
            requests.len()
        );
        if cli.url.is_none() {
            return Ok(());
        }
    }

    let Some(url) = cli.url.clone() else {
        eprintln!("{}", "Please provide a request URL".red());
        std::process::exit(1);
    };

    let method: Method = cli.method.parse().map_err(anyhow::Error::msg)?;
    let params = parse_params(&cli.params).map_err(anyhow::Error::msg)?;
    let body = match &cli.body {
        Some(raw) => Some(serde_json::from_str(raw)?),
        None => None,
    };
    let request = RequestSpec {
        method,
        url,
        params,
        body,
    };

    let runs = (0..cli.repeat.max(1)).map(|_| run_once(&state, &request, cli.batch));

    let outcomes = tokio::select! {
        outcomes = join_all(runs) => outcomes,
        _ = shutdown_rx => {
            eprintln!("Request interrupted");
            return Ok(());
        }
    };

    if cli.json {
        let rendered: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|outcome| match outcome {
                Ok(response) => serde_json::to_value(response).unwrap_or_default(),
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        for outcome in &outcomes {
            print!("{}", format_outcome(outcome, &theme));
        }
        if outcomes.len() > 1 {
            println!("{}", format_summary(outcomes.len(), &state.client.stats()));
        }
    }

    if outcomes.iter().any(|o| o.is_err()) {
        std::process::exit(2);
    }

    Ok(())
}

async fn run_once(
    state: &AppState,
    request: &RequestSpec,
    batched: bool,
) -> Result<Response, CoordError> {
    let client = &state.client;
    if !batched {
        return client.request(request).await;
    }

    match request.method {
        Method::Get => {
            client
                .batch_get(&request.url, request.params.clone())
                .await
        }
        method => {
            let shared = client.clone();
            let url = request.url.clone();
            let body = request.body.clone();
            client
                .batch_submit(move || async move { shared.mutate(method, &url, body).await })
                .await
        }
    }
}

/// Initialize logging with path and level configuration
fn init_logging(logging: &config::Logging) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = config::log_filter_directive(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &logging.path {
        if !path.is_empty() {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .init();
            return Ok(());
        }
    }

    // Log to stderr (default)
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Format one request outcome for the terminal
fn format_outcome(outcome: &Result<Response, CoordError>, theme: &Theme) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    match outcome {
        Ok(response) => {
            let source = if response.is_cached() {
                "[cache]"
            } else {
                "[network]"
            };
            writeln!(
                output,
                "{} {}",
                (theme.status_ok)(&response.status.to_string()),
                (theme.source)(source)
            )
            .ok();
            writeln!(output, "{}", (theme.line)(&"─".repeat(40))).ok();
            write_body(&mut output, &response.body, theme);
        }
        Err(e) => {
            writeln!(output, "{} {}", (theme.status_err)("ERROR"), e).ok();
        }
    }
    writeln!(output).ok();
    output
}

/// One-line summary after a repeated request
fn format_summary(issued: usize, stats: &ClientStats) -> String {
    format!(
        "{} requests issued, {} transport calls, {} cached entries",
        issued, stats.transport_calls, stats.cached_entries
    )
}

fn write_body(output: &mut String, body: &serde_json::Value, theme: &Theme) {
    use std::fmt::Write;

    match body {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                let rendered = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                writeln!(output, "  {}: {}", (theme.key)(key), (theme.body)(&rendered)).ok();
            }
        }
        serde_json::Value::Null => {}
        other => {
            let pretty = serde_json::to_string_pretty(other).unwrap_or_default();
            for line in pretty.lines() {
                writeln!(output, "  {}", (theme.body)(line)).ok();
            }
        }
    }
}

async fn print_status(state: &AppState) {
    println!("{}", "rqc Status".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = state.config.read().await;
    println!("Base URL: {}", config.transport.base_url);
    println!(
        "Cache: {} entries max, ttl {}s",
        config.cache.capacity, config.cache.ttl_secs
    );
    println!("Batch window: {}ms", config.batch.window_delay_ms);
    println!(
        "Config: {}",
        config::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Not found".to_string())
    );

    let stats = state.client.stats();
    println!(
        "Client: {} cached entries, {} in flight, {} transport calls",
        stats.cached_entries, stats.in_flight, stats.transport_calls
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_outcome_plain() {
        let theme = Theme::from_name("plain");
        let response = Response::new(200, json!({ "name": "alice", "age": 30 }));

        let output = format_outcome(&Ok(response.clone()), &theme);
        assert!(output.starts_with("200 [network]"));
        assert!(output.contains("  name: alice"));
        assert!(output.contains("  age: 30"));

        let output = format_outcome(&Ok(response.from_cache()), &theme);
        assert!(output.starts_with("200 [cache]"));
    }

    #[test]
    fn test_format_summary_reports_transport_calls() {
        let stats = ClientStats {
            cached_entries: 1,
            in_flight: 0,
            transport_calls: 1,
        };
        assert_eq!(
            format_summary(5, &stats),
            "5 requests issued, 1 transport calls, 1 cached entries"
        );
    }

    #[test]
    fn test_format_outcome_error() {
        let theme = Theme::from_name("plain");
        let err = CoordError::Transport(reqcoord::TransportError::Timeout);
        let output = format_outcome(&Err(err), &theme);
        assert!(output.contains("ERROR Request timed out"));
    }
}
