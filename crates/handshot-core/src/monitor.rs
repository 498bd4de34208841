//! Session authorization/provider monitoring and the shared error flag

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::session::{AuthorizationStatus, DataProviderKind, DataProviderState, SessionEvent};

/// Process-wide error flag observed by the presentation shell.
///
/// Starts false, can only be raised, never reset.
#[derive(Debug, Clone)]
pub struct ErrorState {
    tx: Arc<watch::Sender<bool>>,
}

impl ErrorState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Set the flag; returns true only on the false -> true transition
    pub fn raise(&self) -> bool {
        self.tx.send_if_modified(|raised| {
            if *raised {
                false
            } else {
                *raised = true;
                true
            }
        })
    }

    pub fn is_raised(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ErrorState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct SessionEventMonitor {
    provider_states: HashMap<DataProviderKind, DataProviderState>,
}

impl SessionEventMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported state of a provider
    pub fn provider_state(&self, provider: DataProviderKind) -> Option<DataProviderState> {
        self.provider_states.get(&provider).copied()
    }

    /// # Panics
    ///
    /// On [`SessionEvent::Unrecognized`]: the event vocabulary is closed and an
    /// unknown kind means the platform contract is unsupported.
    pub fn handle(&mut self, event: SessionEvent, error_state: &ErrorState) {
        match event {
            SessionEvent::AuthorizationChanged {
                authorization,
                status,
            } => {
                info!("Authorization for {:?} changed to {:?}", authorization, status);
                if status == AuthorizationStatus::Denied {
                    warn!("Authorization denied for {:?}", authorization);
                    error_state.raise();
                }
            }
            SessionEvent::DataProviderStateChanged {
                providers,
                new_state,
                error,
            } => {
                info!("Data providers {:?} changed to {:?}", providers, new_state);
                for provider in &providers {
                    self.provider_states.insert(*provider, new_state);
                }
                if let Some(err) = error {
                    error!("Data provider reached an error state: {}", err);
                    error_state.raise();
                }
            }
            SessionEvent::Unrecognized { kind } => {
                unreachable!("Unhandled session event kind: {}", kind)
            }
        }
    }
}
