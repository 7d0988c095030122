pub mod config;
pub mod routes;
pub mod sessions;
pub mod signaling;

use std::sync::Arc;

use config::Config;
use sessions::registry::SessionRegistry;
use signaling::fanout::SignalingBroadcast;
use signaling::relay::SignalingRelay;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<SessionRegistry>,
    pub relay: Arc<SignalingRelay>,
    pub broadcast: SignalingBroadcast,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(SessionRegistry::new());
        let broadcast = SignalingBroadcast::new();
        let relay = Arc::new(SignalingRelay::new(
            registry.clone(),
            broadcast.clone(),
            config.default_max_participants,
        ));

        Self {
            config,
            registry,
            relay,
            broadcast,
        }
    }
}
