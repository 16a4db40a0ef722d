use std::{sync::Arc, time::Duration};

use tokio::sync::{oneshot, Mutex};
use tracing::debug;

use super::{GeoPlace, GeocodeAdapter};
use crate::errors::ServiceError;

/// How a lookup request should be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Wait for the debounce delay; a newer request cancels this one.
    Debounced,
    /// Cancel any pending debounced request and resolve immediately.
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Resolved(GeoPlace),
    /// The address was blank; the coordinate fields should be emptied.
    Cleared,
    /// A newer request for the same field arrived during the delay.
    Superseded,
}

#[derive(Default)]
struct Pending {
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
}

/// Coordinate lookup for a single input field with delay-and-supersede
/// semantics.
///
/// Only the pending wait is cancellable. Once a request has reached the
/// adapter it runs to completion, so a slow older response can still arrive
/// after a newer one.
pub struct DebouncedLookup {
    adapter: Arc<dyn GeocodeAdapter>,
    delay: Duration,
    pending: Mutex<Pending>,
}

impl DebouncedLookup {
    pub fn new(adapter: Arc<dyn GeocodeAdapter>, delay: Duration) -> Self {
        Self { adapter, delay, pending: Mutex::new(Pending::default()) }
    }

    pub fn delay(&self) -> Duration { self.delay }

    pub async fn lookup(&self, address: &str, mode: LookupMode) -> Result<LookupOutcome, ServiceError> {
        match mode {
            LookupMode::Manual => {
                self.cancel_pending().await;
            }
            LookupMode::Debounced => {
                let (tx, rx) = oneshot::channel();
                let generation = {
                    let mut pending = self.pending.lock().await;
                    if let Some(previous) = pending.cancel.replace(tx) {
                        let _ = previous.send(());
                    }
                    pending.generation += 1;
                    pending.generation
                };
                tokio::select! {
                    // a cancel that lands with the deadline still wins
                    biased;
                    _ = rx => {
                        debug!(generation, "lookup superseded");
                        return Ok(LookupOutcome::Superseded);
                    }
                    _ = tokio::time::sleep(self.delay) => {}
                }
                let mut pending = self.pending.lock().await;
                if pending.generation != generation {
                    debug!(generation, "lookup superseded at deadline");
                    return Ok(LookupOutcome::Superseded);
                }
                pending.cancel = None;
            }
        }

        let address = address.trim();
        if address.is_empty() {
            return Ok(LookupOutcome::Cleared);
        }
        debug!(address, ?mode, "resolving address");
        let place = self.adapter.resolve_address(address).await?;
        Ok(LookupOutcome::Resolved(place))
    }

    async fn cancel_pending(&self) {
        let mut pending = self.pending.lock().await;
        pending.generation += 1;
        if let Some(previous) = pending.cancel.take() {
            let _ = previous.send(());
        }
    }
}
