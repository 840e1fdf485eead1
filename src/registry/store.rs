//! Session registry implementation
//!
//! The central store of sessions, keyed by session ID with a secondary
//! index by source address.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{broadcast, Mutex};

use super::config::RegistryConfig;
use super::error::RegistryError;
use crate::mux::Muxer;
use crate::session::{Session, SessionEvent, SessionInfo};
use crate::transport::{redact_credentials, Transport};

/// Registry of all ingestion sessions
///
/// Lookups go through sharded `DashMap`s and never block on I/O. Opens of
/// the same address are serialized by a per-address gate so at most one
/// session exists per source.
pub struct SessionRegistry<T: Transport, M: Muxer> {
    /// Session ID to session
    sessions: DashMap<String, Arc<Session<T, M>>>,

    /// Source address to session ID
    addresses: DashMap<String, String>,

    /// Per-address open gates
    gates: DashMap<String, Arc<Mutex<()>>>,

    transport: Arc<T>,
    muxer: Arc<M>,
    events: broadcast::Sender<SessionEvent>,

    /// Configuration
    config: RegistryConfig,
}

impl<T: Transport, M: Muxer> SessionRegistry<T, M> {
    /// Create a new registry with default configuration
    pub fn new(transport: Arc<T>, muxer: Arc<M>) -> Self {
        Self::with_config(transport, muxer, RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(transport: Arc<T>, muxer: Arc<M>, config: RegistryConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);

        Self {
            sessions: DashMap::new(),
            addresses: DashMap::new(),
            gates: DashMap::new(),
            transport,
            muxer,
            events,
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Open the session for a source address
    ///
    /// Returns the existing session if one is registered for `address`,
    /// restarting it when it is no longer running. Otherwise a new session
    /// is created and started; it is only registered if the start succeeds.
    pub async fn open(&self, address: &str) -> Result<Arc<Session<T, M>>, RegistryError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(RegistryError::InvalidAddress(address.to_string()));
        }

        let gate = Arc::clone(self.gates.entry(address.to_string()).or_default().value());
        let _guard = gate.lock().await;

        if let Some(session) = self.get_by_url(address) {
            if !session.state().is_live() {
                tracing::info!(
                    session_id = %session.id(),
                    address = %redact_credentials(address),
                    state = %session.state(),
                    "Restarting session"
                );
            }
            session.start().await?;
            return Ok(session);
        }

        let session = Arc::new(Session::new(
            address.to_string(),
            Arc::clone(&self.transport),
            Arc::clone(&self.muxer),
            self.config.session.clone(),
            self.events.clone(),
        ));

        if let Err(e) = session.start().await {
            tracing::warn!(
                address = %redact_credentials(address),
                error = %e,
                "Session not registered"
            );
            // Drop the gate unless another open is queued on it
            self.gates
                .remove_if(address, |_, gate| Arc::strong_count(gate) <= 2);
            return Err(e.into());
        }

        let id = session.id().to_string();
        self.addresses.insert(address.to_string(), id.clone());
        self.sessions.insert(id.clone(), Arc::clone(&session));

        tracing::info!(
            session_id = %id,
            address = %redact_credentials(address),
            sessions = self.sessions.len(),
            "Session registered"
        );

        Ok(session)
    }

    /// Look up a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<Session<T, M>>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a session by its exact source address
    pub fn get_by_url(&self, address: &str) -> Option<Arc<Session<T, M>>> {
        let id = self.addresses.get(address.trim())?.value().clone();
        self.get(&id)
    }

    /// Subscribe to lifecycle events of all sessions
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// All registered sessions
    pub fn sessions(&self) -> Vec<Arc<Session<T, M>>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Monitoring snapshot of all registered sessions
    pub fn infos(&self) -> Vec<SessionInfo> {
        self.sessions.iter().map(|entry| entry.value().info()).collect()
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Stop every live session and wait for their workers to exit.
    ///
    /// Sessions stay registered and can be reopened.
    pub async fn shutdown(&self) {
        let sessions = self.sessions();
        let mut stopping = 0usize;

        for session in &sessions {
            if session.stop().is_ok() {
                stopping += 1;
            }
        }

        for session in &sessions {
            session.stopped().await;
        }

        tracing::info!(
            sessions = sessions.len(),
            stopped = stopping,
            "Registry shut down"
        );
    }
}
