//! Debounced batch coordinator.
//!
//! Submissions are queued with a single actor task that owns the pending
//! window exclusively. Every arrival re-arms the window timer, so a batch
//! runs only after `window_delay` passes with no new submissions. On flush
//! each queued operation runs concurrently as its own task and its outcome
//! is delivered to its own submitter as soon as that task settles.

use crate::domain::error::CoordError;
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use uuid::Uuid;

type BatchOperation<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, CoordError>> + Send>;

/// Called with each item's index while a window's tasks are launched.
type LaunchHook = Arc<dyn Fn(usize) + Send + Sync>;

struct BatchItem<T> {
    operation: BatchOperation<T>,
    sink: oneshot::Sender<Result<T, CoordError>>,
}

pub struct BatchCoordinator<T> {
    sender: mpsc::UnboundedSender<BatchItem<T>>,
    window_delay: Duration,
}

impl<T: Send + 'static> BatchCoordinator<T> {
    /// Create a coordinator and spawn its window task.
    ///
    /// Must be called from within a Tokio runtime. The task runs until the
    /// coordinator is dropped, flushing whatever is still pending on exit.
    pub fn new(window_delay: Duration) -> Self {
        Self::spawn(window_delay, None)
    }

    #[cfg(test)]
    pub(crate) fn with_launch_hook(window_delay: Duration, hook: LaunchHook) -> Self {
        Self::spawn(window_delay, Some(hook))
    }

    fn spawn(window_delay: Duration, hook: Option<LaunchHook>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_windows(receiver, window_delay, hook));
        Self {
            sender,
            window_delay,
        }
    }

    /// Queue `operation` for the current window.
    ///
    /// The item is enqueued when `add` is called, not when the returned
    /// future is first polled, and the operation itself is only invoked at
    /// flush time. The returned future resolves with this item's own outcome.
    pub fn add<F, Fut>(
        &self,
        operation: F,
    ) -> impl Future<Output = Result<T, CoordError>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, CoordError>> + Send + 'static,
    {
        let (sink, result) = oneshot::channel();
        let item = BatchItem {
            operation: Box::new(move || operation().boxed()),
            sink,
        };
        let queued = self.sender.send(item).is_ok();

        async move {
            if !queued {
                return Err(CoordError::BatchClosed);
            }
            result.await.unwrap_or(Err(CoordError::BatchClosed))
        }
    }

    pub fn window_delay(&self) -> Duration {
        self.window_delay
    }
}

async fn run_windows<T: Send + 'static>(
    mut receiver: mpsc::UnboundedReceiver<BatchItem<T>>,
    window_delay: Duration,
    hook: Option<LaunchHook>,
) {
    while let Some(first) = receiver.recv().await {
        let mut pending = vec![first];
        let timer = tokio::time::sleep(window_delay);
        tokio::pin!(timer);
        tracing::trace!(delay_ms = window_delay.as_millis() as u64, "batch window opened");

        let closed = loop {
            tokio::select! {
                // Drain arrivals before the timer so items queued back to
                // back land in the same window even with a zero delay.
                biased;
                item = receiver.recv() => match item {
                    Some(item) => {
                        pending.push(item);
                        timer.as_mut().reset(Instant::now() + window_delay);
                    }
                    None => break true,
                },
                () = &mut timer => break false,
            }
        };

        let window = Uuid::new_v4();
        tracing::debug!(%window, items = pending.len(), "flushing batch window");
        tokio::spawn(execute_window(window, pending, hook.clone()));

        if closed {
            break;
        }
    }
    tracing::trace!("batch coordinator closed");
}

async fn execute_window<T: Send + 'static>(
    window: Uuid,
    items: Vec<BatchItem<T>>,
    hook: Option<LaunchHook>,
) {
    let (operations, sinks): (Vec<_>, Vec<_>) = items
        .into_iter()
        .map(|item| (item.operation, item.sink))
        .unzip();

    // Sinks stay here until every task is launched, so a failed launch can
    // still answer the whole snapshot.
    let mut tasks = Vec::with_capacity(operations.len());
    let launched = std::panic::catch_unwind(AssertUnwindSafe(|| {
        for (index, operation) in operations.into_iter().enumerate() {
            if let Some(hook) = &hook {
                hook(index);
            }
            tasks.push(tokio::spawn(async move { operation().await }));
        }
    }));

    if let Err(panic) = launched {
        let message = panic_message(panic.as_ref());
        tracing::warn!(%window, error = %message, "batch window failed");
        for task in &tasks {
            task.abort();
        }
        for sink in sinks {
            let _ = sink.send(Err(CoordError::BatchMachinery(message.clone())));
        }
        return;
    }

    let mut deliveries: FuturesUnordered<_> = tasks
        .into_iter()
        .zip(sinks)
        .map(|(task, sink)| async move {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(CoordError::BatchItem(e.to_string())),
            };
            let failed = outcome.is_err();
            // The submitter may have stopped waiting.
            let _ = sink.send(outcome);
            failed
        })
        .collect();

    let mut failed = 0usize;
    while let Some(item_failed) = deliveries.next().await {
        if item_failed {
            failed += 1;
        }
    }
    tracing::debug!(%window, failed, "batch window settled");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "batch execution panicked".to_string()
    }
}
