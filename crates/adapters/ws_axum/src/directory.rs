//! Connection table — the transport-owned implementation of
//! [`ClientDirectory`].
//!
//! Each connection registers an unbounded channel sender at handshake time;
//! the per-connection writer task drains the receiver into the socket. The
//! core only ever sees client ids, so a connection can drop at any moment
//! without invalidating anything the core holds.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::mpsc;

use domo_app::ports::{ClientDirectory, DeliveryError};
use domo_domain::id::ClientId;

#[derive(Debug, Default)]
pub struct WsClientDirectory {
    senders: RwLock<HashMap<ClientId, mpsc::UnboundedSender<String>>>,
}

impl WsClientDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound channel under its client id.
    pub fn register(&self, client: ClientId, sender: mpsc::UnboundedSender<String>) {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(client, sender);
        tracing::debug!(%client, "connection registered");
    }

    /// Drop a connection's entry. Idempotent.
    pub fn unregister(&self, client: ClientId) {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&client);
        tracing::debug!(%client, "connection unregistered");
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClientDirectory for WsClientDirectory {
    fn send(&self, client: ClientId, payload: &str) -> Result<(), DeliveryError> {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        let sender = senders
            .get(&client)
            .ok_or(DeliveryError::UnknownClient(client))?;
        sender
            .send(payload.to_string())
            .map_err(|_| DeliveryError::Closed(client))
    }

    fn client_ids(&self) -> Vec<ClientId> {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }
}
