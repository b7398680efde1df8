/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - gate: immutable admission rules
 *   - identity: the external identity collaborator
 * - Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::services::admission::AdmissionGate;
use crate::services::identity::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AdmissionGate>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(gate: Arc<AdmissionGate>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { gate, identity }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gate", &self.gate)
            .field("identity", &self.identity.provider_name())
            .finish()
    }
}
