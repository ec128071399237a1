//! Shared test transport.

#![allow(dead_code)]

use async_trait::async_trait;
use reqcoord::{
    BatchConfig, CacheConfig, CoordinatedClient, RequestSpec, Response, Transport, TransportError,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Transport that counts calls, records when they happened and fails for
/// URLs registered with [`MockTransport::fail_on`].
pub struct MockTransport {
    calls: AtomicUsize,
    delay: Duration,
    failing: Mutex<HashSet<String>>,
    sent: Mutex<Vec<(Instant, RequestSpec)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            failing: Mutex::new(HashSet::new()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_on(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(Instant, RequestSpec)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &RequestSpec) -> Result<Response, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.lock().unwrap().contains(&request.url) {
            return Err(TransportError::Status {
                status: 500,
                message: format!("{} failed", request.url),
            });
        }

        Ok(Response::new(
            200,
            json!({
                "method": request.method.as_str(),
                "url": request.url,
                "params": request.params,
                "call": call,
            }),
        ))
    }
}

pub fn client_with(
    transport: &Arc<MockTransport>,
    capacity: usize,
    ttl: Duration,
    window: Duration,
) -> CoordinatedClient<Arc<MockTransport>> {
    CoordinatedClient::with_settings(
        transport.clone(),
        &CacheConfig {
            capacity,
            ttl_secs: ttl.as_secs(),
        },
        &BatchConfig {
            window_delay_ms: window.as_millis() as u64,
        },
    )
}

pub fn default_client(transport: &Arc<MockTransport>) -> CoordinatedClient<Arc<MockTransport>> {
    client_with(
        transport,
        100,
        Duration::from_secs(300),
        Duration::from_millis(50),
    )
}
