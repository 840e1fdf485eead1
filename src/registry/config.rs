//! Registry configuration

use crate::session::SessionConfig;

/// Default capacity of the lifecycle event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Configuration for the session registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Configuration applied to every session the registry creates
    pub session: SessionConfig,

    /// Lifecycle events buffered per subscriber before it starts lagging
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Set the per-session configuration
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Set the event channel capacity (minimum 1)
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
