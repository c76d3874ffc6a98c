//! Permission gate
//!
//! The gate is the core's only view of the host authorization store.
//! `classify` is a pure query; `request_missing` shows the platform's
//! one-time request UI and resolves with the post-request classification.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{Capability, CapabilitySet, GrantState, PermissionClassification};

/// Host authorization store
///
/// Implementations wrap the platform permission API. The orchestrator never
/// issues a second `request_missing` while one is outstanding.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Current grant state of a single capability
    fn grant_state(&self, capability: Capability) -> GrantState;

    /// Classify `requested` against the current grant state (no side effects)
    fn classify(&self, requested: &CapabilitySet) -> PermissionClassification {
        PermissionClassification::from_states(requested, |c| self.grant_state(c))
    }

    fn is_granted(&self, capability: Capability) -> bool {
        self.grant_state(capability).is_granted()
    }

    /// Show the platform request UI for exactly `capabilities`
    ///
    /// Resolves once, after the user has answered, with the classification of
    /// `capabilities` as it stands after the request.
    async fn request_missing(&self, capabilities: &CapabilitySet) -> PermissionClassification;
}

/// Table-driven gate for hosts without an interactive permission system
///
/// Grant states come from configuration. Capabilities listed in
/// `grant_on_request` flip to granted when requested, mimicking a user who
/// accepts the dialog; everything else keeps its state.
#[derive(Debug, Default)]
pub struct StaticPermissionGate {
    states: Mutex<HashMap<Capability, GrantState>>,
    grant_on_request: CapabilitySet,
}

impl StaticPermissionGate {
    /// Every capability granted
    pub fn all_granted() -> Self {
        let gate = Self::default();
        for capability in Capability::ALL {
            gate.set(capability, GrantState::Granted);
        }
        gate
    }

    /// Build from explicit sets; capabilities not listed are denied
    pub fn new(
        granted: &CapabilitySet,
        permanently_denied: &CapabilitySet,
        grant_on_request: CapabilitySet,
    ) -> Self {
        let gate = Self {
            states: Mutex::new(HashMap::new()),
            grant_on_request,
        };
        for &capability in granted {
            gate.set(capability, GrantState::Granted);
        }
        for &capability in permanently_denied {
            gate.set(capability, GrantState::PermanentlyDenied);
        }
        gate
    }

    pub fn set(&self, capability: Capability, state: GrantState) {
        self.states.lock().insert(capability, state);
    }
}

#[async_trait]
impl PermissionGate for StaticPermissionGate {
    fn grant_state(&self, capability: Capability) -> GrantState {
        self.states
            .lock()
            .get(&capability)
            .copied()
            .unwrap_or(GrantState::Denied)
    }

    async fn request_missing(&self, capabilities: &CapabilitySet) -> PermissionClassification {
        info!(
            "Requesting {} capability(ies): {:?}",
            capabilities.len(),
            capabilities
        );

        let mut states = self.states.lock();
        let mut result = PermissionClassification::default();
        for &capability in capabilities {
            let current = states
                .get(&capability)
                .copied()
                .unwrap_or(GrantState::Denied);
            // Permanently denied capabilities never reach the dialog
            let next = match current {
                GrantState::Denied if self.grant_on_request.contains(&capability) => {
                    GrantState::Granted
                }
                other => other,
            };
            debug!("{capability}: {current:?} -> {next:?}");
            states.insert(capability, next);
            result.insert(capability, next);
        }
        result
    }
}
