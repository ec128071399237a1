//! Client-side request coordination.
//!
//! [`CoordinatedClient`] sits between application call sites and a
//! [`Transport`]. GET responses are cached with a TTL and a FIFO capacity
//! bound, concurrent identical GETs share a single transport call, and
//! batched submissions are collected into debounced windows whose items
//! succeed or fail independently.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod state;

pub use application::client::{ClientStats, CoordinatedClient};
pub use domain::error::{CoordError, TransportError};
pub use domain::model::{Fingerprint, Method, RequestSpec, Response, ResponseSource};
pub use domain::traits::Transport;
pub use infrastructure::config::{BatchConfig, CacheConfig, Config, TransportConfig};
pub use infrastructure::network::batch::BatchCoordinator;
pub use infrastructure::network::http::HttpTransport;
pub use infrastructure::network::inflight::InFlightRegistry;
pub use infrastructure::storage::cache::ResponseCache;
