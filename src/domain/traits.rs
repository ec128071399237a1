use crate::domain::error::TransportError;
use crate::domain::model::{RequestSpec, Response};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for network transports
///
/// The coordination layer consumes the network only through this single
/// operation. Timeouts, retries and authentication belong to the
/// implementation; a timeout is reported as an ordinary error.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send one request and wait for its response
    async fn send(&self, request: &RequestSpec) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &RequestSpec) -> Result<Response, TransportError> {
        (**self).send(request).await
    }
}
