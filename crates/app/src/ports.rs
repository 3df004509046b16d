//! Port traits implemented by the transport collaborator.
//!
//! The core holds no owning references to connections: it addresses clients
//! by [`ClientId`] through a directory owned by the transport, which is free
//! to drop connections at any time.

use std::sync::Arc;

use thiserror::Error;

use domo_domain::event::StateEvent;
use domo_domain::id::ClientId;

/// Why a delivery to one client failed.
///
/// Delivery failures are never fatal: the broadcaster logs them and moves on
/// to the next subscriber.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No connection is registered under this client id.
    #[error("client {0} is not connected")]
    UnknownClient(ClientId),
    /// The connection's outbound channel is gone.
    #[error("connection for client {0} is closed")]
    Closed(ClientId),
}

/// Collaborator-owned connection table, addressed by client id.
pub trait ClientDirectory {
    /// Deliver a serialized payload to one client.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the client is unknown or its
    /// connection has gone away. Must not block on a slow client.
    fn send(&self, client: ClientId, payload: &str) -> Result<(), DeliveryError>;

    /// Point-in-time list of every connected client.
    fn client_ids(&self) -> Vec<ClientId>;
}

impl<T: ClientDirectory + ?Sized> ClientDirectory for Arc<T> {
    fn send(&self, client: ClientId, payload: &str) -> Result<(), DeliveryError> {
        (**self).send(client, payload)
    }

    fn client_ids(&self) -> Vec<ClientId> {
        (**self).client_ids()
    }
}

/// Outlet for events the state manager must publish itself — an alarm
/// auto-triggering from a failed-unlock threshold reaches every subscriber
/// through this port, not just the caller of the unlock.
pub trait EventSink {
    /// Publish an event to every subscriber of its house.
    fn emit(&self, event: &StateEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, event: &StateEvent) {
        (**self).emit(event);
    }
}

/// Sink that drops every event; used where no fan-out is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: &StateEvent) {}
}
