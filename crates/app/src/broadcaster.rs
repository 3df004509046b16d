//! Broadcaster — per-house fan-out of change events.
//!
//! Delivery runs over a point-in-time subscriber snapshot and never holds
//! the state manager's locks: a mutation completes and releases its house
//! lock before fan-out begins, so a slow client can never stall unrelated
//! mutations. Per-client failures are logged and counted; the subscriber
//! stays registered until the transport calls `detach`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use domo_domain::event::StateEvent;
use domo_domain::id::{ClientId, HouseId};

use crate::ports::{ClientDirectory, EventSink};
use crate::subscriptions::SubscriptionRegistry;

/// Fan-out of serialized events to house subscribers via the transport's
/// connection table.
pub struct Broadcaster<D> {
    registry: Arc<SubscriptionRegistry>,
    directory: D,
    delivery_failures: AtomicU64,
}

impl<D: ClientDirectory> Broadcaster<D> {
    /// Create a broadcaster over the given registry and connection table.
    pub fn new(registry: Arc<SubscriptionRegistry>, directory: D) -> Self {
        Self {
            registry,
            directory,
            delivery_failures: AtomicU64::new(0),
        }
    }

    /// Deliver `event` to every current subscriber of `house_id`, except
    /// `exclude` (normally the originator of the change).
    ///
    /// Returns the number of successful deliveries.
    pub fn broadcast(
        &self,
        house_id: HouseId,
        event: &StateEvent,
        exclude: Option<ClientId>,
    ) -> usize {
        let Some(payload) = serialize(event) else {
            return 0;
        };
        let mut delivered = 0;
        for client in self.registry.subscribers_of(house_id) {
            if Some(client) == exclude {
                continue;
            }
            if self.deliver(client, &payload) {
                delivered += 1;
            }
        }
        tracing::debug!(house = %house_id, delivered, "broadcast complete");
        delivered
    }

    /// Deliver `event` to every connected client, regardless of house
    /// subscription. Used for system-wide notices.
    pub fn broadcast_to_all(&self, event: &StateEvent) -> usize {
        let Some(payload) = serialize(event) else {
            return 0;
        };
        let mut delivered = 0;
        for client in self.directory.client_ids() {
            if self.deliver(client, &payload) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Total failed deliveries since construction.
    #[must_use]
    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.load(Ordering::Relaxed)
    }

    fn deliver(&self, client: ClientId, payload: &str) -> bool {
        match self.directory.send(client, payload) {
            Ok(()) => true,
            Err(err) => {
                self.delivery_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%client, error = %err, "event delivery failed");
                false
            }
        }
    }
}

impl<D: ClientDirectory> EventSink for Broadcaster<D> {
    fn emit(&self, event: &StateEvent) {
        self.broadcast(event.house_id, event, None);
    }
}

fn serialize(event: &StateEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize event payload");
            None
        }
    }
}
