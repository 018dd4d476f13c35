use std::future::Future;

use tokio::task::{JoinError, JoinSet};
use tracing::{error, trace};

use crate::error::DispatchError;

/// Owns every running handler task and reclaims them as they finish.
///
/// Each task resolves to the order number of the connection it handled.
/// Dropping the reaper aborts any handlers still running.
pub struct Reaper {
    handlers: JoinSet<u64>,
    limit: usize,
}

impl Reaper {
    pub fn new(limit: usize) -> Self {
        Self {
            handlers: JoinSet::new(),
            limit,
        }
    }

    /// Handlers spawned and not yet reclaimed.
    pub fn active(&self) -> usize {
        self.handlers.len()
    }

    /// Spawns a handler task. When the pool is full the handler is dropped
    /// without ever being polled, closing whatever connection it owns.
    pub fn spawn<F>(&mut self, order: u64, handler: F) -> Result<(), DispatchError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.handlers.len() >= self.limit {
            self.reap();
        }
        if self.handlers.len() >= self.limit {
            return Err(DispatchError::SpawnFailure {
                active: self.handlers.len(),
                limit: self.limit,
            });
        }

        self.handlers.spawn(async move {
            handler.await;
            order
        });
        Ok(())
    }

    /// Reclaims every handler that has already finished, without waiting.
    /// Returns how many were reclaimed.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(result) = self.handlers.try_join_next() {
            record(result);
            reaped += 1;
        }
        reaped
    }

    /// Waits for the next handler to finish and reclaims it.
    ///
    /// Returns `None` immediately when no handlers are running.
    pub async fn reap_next(&mut self) -> Option<()> {
        let result = self.handlers.join_next().await?;
        record(result);
        Some(())
    }
}

fn record(result: Result<u64, JoinError>) {
    match result {
        Ok(order) => trace!(order, "Handler reaped"),
        Err(e) if e.is_panic() => error!(error = %e, "Handler panicked"),
        Err(e) => trace!(error = %e, "Handler cancelled"),
    }
}
