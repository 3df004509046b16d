//! Subscription registry — which clients are watching which house.
//!
//! The registry has its own mutex, independent of house-state locking:
//! membership churn must never contend with device mutations, and the
//! broadcaster iterates a point-in-time copy so delivery happens outside
//! any lock.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use domo_domain::id::{ClientId, HouseId};

#[derive(Debug, Default)]
struct Membership {
    by_house: HashMap<HouseId, HashSet<ClientId>>,
    by_client: HashMap<ClientId, HouseId>,
}

/// House ↔ client membership. Each client subscribes to at most one house
/// at a time; joining a second house implicitly leaves the first.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    inner: Mutex<Membership>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `client` to `house_id`, leaving any previous house.
    pub fn join(&self, house_id: HouseId, client: ClientId) {
        let mut inner = self.lock();
        if let Some(previous) = inner.by_client.insert(client, house_id) {
            if previous == house_id {
                return;
            }
            remove_member(&mut inner.by_house, previous, client);
        }
        inner.by_house.entry(house_id).or_default().insert(client);
        tracing::debug!(%client, house = %house_id, "client joined house");
    }

    /// Unsubscribe `client` from `house_id`. No-op when not subscribed.
    pub fn leave(&self, house_id: HouseId, client: ClientId) {
        let mut inner = self.lock();
        if inner.by_client.get(&client) == Some(&house_id) {
            inner.by_client.remove(&client);
            remove_member(&mut inner.by_house, house_id, client);
            tracing::debug!(%client, house = %house_id, "client left house");
        }
    }

    /// Remove `client` from whatever house it is subscribed to.
    ///
    /// Called by the transport on disconnect so registry entries never leak.
    pub fn detach(&self, client: ClientId) {
        let mut inner = self.lock();
        if let Some(house_id) = inner.by_client.remove(&client) {
            remove_member(&mut inner.by_house, house_id, client);
            tracing::debug!(%client, house = %house_id, "client detached");
        }
    }

    /// Point-in-time copy of the subscriber set, safe to iterate while
    /// other join/leave calls proceed.
    #[must_use]
    pub fn subscribers_of(&self, house_id: HouseId) -> Vec<ClientId> {
        self.lock()
            .by_house
            .get(&house_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The house `client` is currently subscribed to, if any.
    #[must_use]
    pub fn house_of(&self, client: ClientId) -> Option<HouseId> {
        self.lock().by_client.get(&client).copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Membership> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn remove_member(
    by_house: &mut HashMap<HouseId, HashSet<ClientId>>,
    house_id: HouseId,
    client: ClientId,
) {
    if let Some(set) = by_house.get_mut(&house_id) {
        set.remove(&client);
        if set.is_empty() {
            by_house.remove(&house_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_list_subscribers_after_join() {
        let registry = SubscriptionRegistry::new();
        let client = ClientId::new();
        registry.join(HouseId::new(1), client);
        assert_eq!(registry.subscribers_of(HouseId::new(1)), vec![client]);
    }

    #[test]
    fn should_move_client_when_joining_another_house() {
        let registry = SubscriptionRegistry::new();
        let client = ClientId::new();
        registry.join(HouseId::new(1), client);
        registry.join(HouseId::new(2), client);

        assert!(registry.subscribers_of(HouseId::new(1)).is_empty());
        assert_eq!(registry.subscribers_of(HouseId::new(2)), vec![client]);
        assert_eq!(registry.house_of(client), Some(HouseId::new(2)));
    }

    #[test]
    fn should_remove_subscriber_on_leave() {
        let registry = SubscriptionRegistry::new();
        let client = ClientId::new();
        registry.join(HouseId::new(1), client);
        registry.leave(HouseId::new(1), client);
        assert!(registry.subscribers_of(HouseId::new(1)).is_empty());
        assert_eq!(registry.house_of(client), None);
    }

    #[test]
    fn should_ignore_leave_for_wrong_house() {
        let registry = SubscriptionRegistry::new();
        let client = ClientId::new();
        registry.join(HouseId::new(1), client);
        registry.leave(HouseId::new(2), client);
        assert_eq!(registry.subscribers_of(HouseId::new(1)), vec![client]);
    }

    #[test]
    fn should_detach_from_current_house() {
        let registry = SubscriptionRegistry::new();
        let client = ClientId::new();
        registry.join(HouseId::new(3), client);
        registry.detach(client);
        assert!(registry.subscribers_of(HouseId::new(3)).is_empty());
        assert_eq!(registry.house_of(client), None);
    }

    #[test]
    fn should_tolerate_detach_of_unknown_client() {
        let registry = SubscriptionRegistry::new();
        registry.detach(ClientId::new());
    }

    #[test]
    fn should_return_independent_snapshot() {
        let registry = SubscriptionRegistry::new();
        let a = ClientId::new();
        let b = ClientId::new();
        registry.join(HouseId::new(1), a);

        let snapshot = registry.subscribers_of(HouseId::new(1));
        registry.join(HouseId::new(1), b);

        assert_eq!(snapshot, vec![a]);
        assert_eq!(registry.subscribers_of(HouseId::new(1)).len(), 2);
    }
}
