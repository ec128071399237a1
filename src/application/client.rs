use crate::domain::error::CoordError;
use crate::domain::model::{Method, RequestSpec, Response};
use crate::domain::traits::Transport;
use crate::infrastructure::config::{BatchConfig, CacheConfig, Config};
use crate::infrastructure::network::batch::BatchCoordinator;
use crate::infrastructure::network::inflight::InFlightRegistry;
use crate::infrastructure::storage::cache::ResponseCache;
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Snapshot of the client's bookkeeping.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ClientStats {
    pub cached_entries: usize,
    pub in_flight: usize,
    /// Calls this client has made to its transport, batched ones included.
    pub transport_calls: usize,
}

/// Request facade shared by every call site in a process.
///
/// GET requests are served from the response cache when fresh and
/// otherwise coalesced so that concurrent identical requests cost one
/// transport call. Mutations always go straight to the transport. Batched
/// submissions are collected into debounced windows.
///
/// Construct inside a Tokio runtime; the batch window task is spawned on
/// creation.
pub struct CoordinatedClient<T: Transport> {
    transport: Arc<T>,
    cache: ResponseCache,
    in_flight: InFlightRegistry,
    batch: BatchCoordinator<Response>,
    transport_calls: Arc<AtomicUsize>,
}

impl<T: Transport> CoordinatedClient<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self::with_settings(transport, &config.cache, &config.batch)
    }

    pub fn with_settings(transport: T, cache: &CacheConfig, batch: &BatchConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            cache: ResponseCache::from_config(cache),
            in_flight: InFlightRegistry::new(),
            batch: BatchCoordinator::new(batch.window_delay()),
            transport_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Cached, deduplicated GET.
    pub async fn get(&self, url: &str, params: Value) -> Result<Response, CoordError> {
        let request = RequestSpec::get(url, params);
        let key = request.fingerprint();

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(url, key = key.short(), "cache hit");
            return Ok(hit.from_cache());
        }
        tracing::debug!(url, key = key.short(), "cache miss");

        let transport = &self.transport;
        let cache = &self.cache;
        let calls = &self.transport_calls;
        let request = &request;
        let cache_key = key.clone();

        let outcome = self
            .in_flight
            .dispatch(key, move || async move {
                // A leader that settled between our lookup and registration
                // has already filled the cache.
                if let Some(hit) = cache.get(&cache_key) {
                    return Ok(hit.from_cache());
                }
                calls.fetch_add(1, Ordering::Relaxed);
                let outcome = transport.send(request).await;
                if let Ok(response) = &outcome {
                    cache.set(cache_key, response.clone());
                }
                outcome
            })
            .await;

        Ok(outcome?)
    }

    /// Uncached, never deduplicated write.
    pub async fn mutate(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Response, CoordError> {
        if method == Method::Get {
            return Err(CoordError::InvalidRequest(
                "GET requests go through get()".to_string(),
            ));
        }
        self.send_direct(&RequestSpec::with_body(method, url, body))
            .await
    }

    /// Route a request description by method.
    pub async fn request(&self, request: &RequestSpec) -> Result<Response, CoordError> {
        match request.method {
            Method::Get => self.get(&request.url, request.params.clone()).await,
            _ => self.send_direct(request).await,
        }
    }

    async fn send_direct(&self, request: &RequestSpec) -> Result<Response, CoordError> {
        tracing::debug!(method = %request.method, url = %request.url, "direct request");
        self.transport_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.transport.send(request).await?)
    }

    /// Queue an operation in the current batch window.
    pub fn batch_submit<F, Fut>(
        &self,
        operation: F,
    ) -> impl Future<Output = Result<Response, CoordError>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Response, CoordError>> + Send + 'static,
    {
        self.batch.add(operation)
    }

    /// Queue a plain transport GET in the current batch window.
    ///
    /// Batched requests bypass the response cache and the in-flight registry.
    pub fn batch_get(
        &self,
        url: &str,
        params: Value,
    ) -> impl Future<Output = Result<Response, CoordError>> + Send + 'static {
        let transport = self.transport.clone();
        let calls = self.transport_calls.clone();
        let request = RequestSpec::get(url, params);
        self.batch.add(move || async move {
            calls.fetch_add(1, Ordering::Relaxed);
            transport
                .send(&request)
                .await
                .map_err(CoordError::from)
        })
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
        tracing::debug!("response cache cleared");
    }

    /// Best-effort warm-up. Individual failures are logged and ignored;
    /// returns once every request has settled, with the number that succeeded.
    pub async fn preload(&self, requests: &[RequestSpec]) -> usize {
        let outcomes = join_all(requests.iter().map(|request| self.request(request))).await;

        let mut succeeded = 0;
        for (request, outcome) in requests.iter().zip(outcomes) {
            match outcome {
                Ok(_) => succeeded += 1,
                Err(e) => tracing::debug!(url = %request.url, error = %e, "preload failed"),
            }
        }
        tracing::info!(total = requests.len(), succeeded, "preload finished");
        succeeded
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            cached_entries: self.cache.len(),
            in_flight: self.in_flight.len(),
            transport_calls: self.transport_calls.load(Ordering::Relaxed),
        }
    }
}
