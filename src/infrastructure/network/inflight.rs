//! In-flight request registry.
//!
//! Concurrent callers asking for the same fingerprint share one transport
//! call. The first caller becomes the leader and runs the operation; every
//! caller arriving while it is outstanding subscribes to the leader's
//! broadcast and receives the same outcome.

use crate::domain::error::TransportError;
use crate::domain::model::{Fingerprint, Response};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use tokio::sync::broadcast;
use tokio::time::Instant;

pub type Outcome = Result<Response, TransportError>;

struct InFlight {
    sender: broadcast::Sender<Outcome>,
    started_at: Instant,
}

enum Slot {
    /// No operation was outstanding; this caller runs it.
    Leader(broadcast::Sender<Outcome>),
    /// Another caller is running it; wait for the broadcast.
    Follower(broadcast::Receiver<Outcome>),
}

#[derive(Default)]
pub struct InFlightRegistry {
    in_flight: DashMap<Fingerprint, InFlight>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }

    /// Run `factory` unless an identical operation is already outstanding.
    ///
    /// `factory` is invoked at most once per fingerprint while an operation
    /// is in flight. The registry entry is removed before the outcome is
    /// delivered, so a call made after settlement always starts fresh.
    pub async fn dispatch<F, Fut>(&self, key: Fingerprint, factory: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        loop {
            match self.acquire(&key) {
                Slot::Follower(mut receiver) => match receiver.recv().await {
                    Ok(outcome) => return outcome,
                    Err(_) => {
                        // Leader was dropped before settling; its guard has
                        // already cleared the entry, so compete again.
                        tracing::debug!(key = key.short(), "in-flight leader vanished, retrying");
                        continue;
                    }
                },
                Slot::Leader(sender) => {
                    let guard = InFlightGuard::new(self, key);
                    let outcome = factory().await;
                    guard.complete();
                    // No receivers is fine: nobody attached.
                    let _ = sender.send(outcome.clone());
                    return outcome;
                }
            }
        }
    }

    /// Atomic check-and-register under the map's shard lock.
    fn acquire(&self, key: &Fingerprint) -> Slot {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!(key = key.short(), "attached to in-flight request");
                Slot::Follower(entry.get().sender.subscribe())
            }
            Entry::Vacant(entry) => {
                let (sender, _receiver) = broadcast::channel(1);
                entry.insert(InFlight {
                    sender: sender.clone(),
                    started_at: Instant::now(),
                });
                Slot::Leader(sender)
            }
        }
    }

    fn remove(&self, key: &Fingerprint) {
        if let Some((_, in_flight)) = self.in_flight.remove(key) {
            tracing::trace!(
                key = key.short(),
                elapsed_ms = in_flight.started_at.elapsed().as_millis() as u64,
                "in-flight request settled"
            );
        }
    }

    /// Number of outstanding operations.
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// Clears the registry entry even if the leader's future is dropped or
/// panics mid-operation.
struct InFlightGuard<'a> {
    registry: &'a InFlightRegistry,
    key: Fingerprint,
    completed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(registry: &'a InFlightRegistry, key: Fingerprint) -> Self {
        Self {
            registry,
            key,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.registry.remove(&self.key);
        self.completed = true;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.registry.remove(&self.key);
        }
    }
}
