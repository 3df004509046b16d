//! Shared application state for the axum router.

use std::sync::Arc;

use domo_app::broadcaster::Broadcaster;
use domo_app::dispatcher::Dispatcher;
use domo_app::state_manager::StateManager;
use domo_app::subscriptions::SubscriptionRegistry;

use crate::directory::WsClientDirectory;

pub type HubBroadcaster = Broadcaster<Arc<WsClientDirectory>>;
pub type HubStateManager = StateManager<Arc<HubBroadcaster>>;
pub type HubDispatcher = Dispatcher<Arc<WsClientDirectory>>;

/// Everything a connection handler needs, cheaply cloneable.
#[derive(Clone)]
pub struct HubState {
    pub directory: Arc<WsClientDirectory>,
    pub manager: Arc<HubStateManager>,
    pub dispatcher: Arc<HubDispatcher>,
}

impl HubState {
    /// Wire the core together: connection table, subscription registry,
    /// broadcaster, state manager, dispatcher.
    ///
    /// The broadcaster doubles as the state manager's event sink so
    /// security-triggered events fan out to house subscribers.
    #[must_use]
    pub fn assemble() -> Self {
        let directory = Arc::new(WsClientDirectory::new());
        let registry = Arc::new(SubscriptionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(
            Arc::clone(&registry),
            Arc::clone(&directory),
        ));
        let manager = Arc::new(StateManager::new(Arc::clone(&broadcaster)));
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&manager), registry, broadcaster));
        Self {
            directory,
            manager,
            dispatcher,
        }
    }
}

impl Default for HubState {
    fn default() -> Self {
        Self::assemble()
    }
}
